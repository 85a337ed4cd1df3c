//! Integration tests for the default tweak set configured from JSON documents.

use std::sync::Arc;

use classpatch::{
    assembly::{analyze_stack, opcodes, Instruction},
    classfile::{ClassBuilder, ClassRecord, Constant, Type},
    events::EventKind,
    module::{ConfigSnapshot, ModuleId, ModuleRegistry},
    tweaks, Error, Result,
};

fn scanner_from_json(json: &str) -> Result<classpatch::scanner::Scanner> {
    let registry = ModuleRegistry::from_json(json)?;
    Ok(tweaks::default_scanner(Arc::new(registry)))
}

fn fps_class() -> Result<ClassRecord> {
    ClassBuilder::new("com/moonsworth/lunar/q/Z")
        .string_constant("[1466 FPS]")
        .method("a", "()Ljava/lang/String;", |m| {
            m.public().code(vec![
                Instruction::Ldc("\u{1} FPS".into()),
                Instruction::Ldc("\u{1}".into()),
                Instruction::invoke_static("com/moonsworth/lunar/q/B", "bridge$getDebugFPS", "()I"),
                Instruction::invoke_static("java/lang/String", "valueOf", "(I)Ljava/lang/String;"),
                Instruction::invoke_virtual(
                    "java/lang/String",
                    "replace",
                    "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Ljava/lang/String;",
                ),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .method("b", "()Ljava/lang/String;", |m| {
            m.public().code(vec![
                Instruction::Ldc("fps".into()),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .build()
}

fn cloth_class() -> Result<ClassRecord> {
    ClassBuilder::new("com/moonsworth/lunar/q/C")
        .string_constant("Refreshed render target textures.")
        .method("a", "(Ljava/lang/Object;)Z", |m| {
            m.public().code(vec![
                Instruction::Ldc("LunarPlus".into()),
                Instruction::var(opcodes::ALOAD, 1),
                Instruction::invoke_virtual("java/lang/Object", "equals", "(Ljava/lang/Object;)Z"),
                Instruction::Simple(opcodes::IRETURN),
            ])
        })
        .build()
}

fn sprint_states_class() -> Result<ClassRecord> {
    let states = [
        "flying",
        "boost",
        "riding",
        "descending",
        "dismounting",
        "sneaking",
        "toggled",
        "sprinting",
    ];
    let mut clinit = vec![Instruction::Ldc("settings".into()), Instruction::Simple(opcodes::POP)];
    for state in states {
        clinit.push(Instruction::Ldc(state.into()));
        clinit.push(Instruction::Simple(opcodes::POP));
    }
    clinit.push(Instruction::Simple(opcodes::RETURN));

    ClassBuilder::new("com/moonsworth/lunar/q/S")
        .enumeration()
        .method("<clinit>", "()V", |m| m.static_method().code(clinit))
        .build()
}

#[test]
fn test_fps_text_from_config() -> Result<()> {
    let scanner = scanner_from_json(
        r#"{
            "modules": {
                "change_mod_strings": { "enabled": true, "options": { "fps_text": "CPS" } }
            }
        }"#,
    )?;
    assert!(scanner.issues().is_empty());

    let mut class = fps_class()?;
    let report = scanner.transform(&mut class)?;
    assert!(report.is_modified());
    assert_eq!(report.events.count_kind(EventKind::ConstantReplaced), 1);

    assert_eq!(class.methods[0].instructions[0], Instruction::Ldc("\u{1} CPS".into()));
    assert_eq!(class.methods[0].instructions[1], Instruction::Ldc("\u{1}".into()));
    assert_eq!(class.methods[1].instructions[0], Instruction::Ldc("fps".into()));
    Ok(())
}

#[test]
fn test_fps_text_and_spoof_share_one_block() -> Result<()> {
    let scanner = scanner_from_json(
        r#"{
            "modules": {
                "change_mod_strings": { "enabled": true, "options": { "fps_text": "CPS" } },
                "fps_spoof": { "enabled": true, "options": { "multiplier": 3.0 } }
            }
        }"#,
    )?;

    let mut class = fps_class()?;
    let report = scanner.transform(&mut class)?;
    assert_eq!(report.transformed.len(), 1);
    assert_eq!(report.events.count_kind(EventKind::ConstantReplaced), 1);
    assert_eq!(report.events.count_kind(EventKind::AdviceInserted), 1);

    let method = &class.methods[0];
    assert!(method.strings().any(|s| s == "\u{1} CPS"));
    assert!(method.constants().any(|c| c == Constant::Float(3.0)));
    assert_eq!(method.max_stack, analyze_stack(method)?.max_stack);
    Ok(())
}

#[test]
fn test_cloth_capes_always_enabled() -> Result<()> {
    let scanner = scanner_from_json(r#"{"modules": {"cloth_capes": {"enabled": true}}}"#)?;

    let mut class = cloth_class()?;
    scanner.transform(&mut class)?;

    let method = &class.methods[0];
    assert_eq!(
        method.instructions,
        vec![
            Instruction::Simple(opcodes::ICONST_1),
            Instruction::Simple(opcodes::IRETURN)
        ]
    );
    assert_eq!(method.return_type, Type::Boolean);
    Ok(())
}

#[test]
fn test_toggle_sprint_states_renamed() -> Result<()> {
    let scanner = scanner_from_json(
        r#"{
            "modules": {
                "toggle_sprint_text": {
                    "enabled": true,
                    "options": { "sprinting_text": "running", "sneaking_text": "crouching" }
                }
            }
        }"#,
    )?;

    let mut class = sprint_states_class()?;
    let report = scanner.transform(&mut class)?;
    assert!(report.failures.is_empty());

    let strings: Vec<&str> = class.methods[0].strings().collect();
    assert!(strings.contains(&"running"));
    assert!(strings.contains(&"crouching"));
    assert!(strings.contains(&"flying"));
    assert!(!strings.contains(&"sprinting"));
    assert!(!strings.contains(&"sneaking"));
    Ok(())
}

#[test]
fn test_config_errors_disable_only_their_module() -> Result<()> {
    let scanner = scanner_from_json(
        r#"{
            "modules": {
                "metadata_url": { "enabled": true },
                "fps_spoof": { "enabled": true, "options": { "multiplier": "fast" } },
                "cloth_capes": { "enabled": true },
                "no_such_module": { "enabled": true }
            }
        }"#,
    )?;

    let broken: Vec<ModuleId> = scanner
        .issues()
        .iter()
        .filter_map(|issue| match issue {
            Error::ModuleConfig { module, .. } => Some(*module),
            _ => None,
        })
        .collect();
    assert!(broken.contains(&ModuleId::MetadataUrl));
    assert!(broken.contains(&ModuleId::FpsSpoof));
    assert!(!broken.contains(&ModuleId::ClothCapes));
    assert_eq!(
        scanner.build_events().count_kind(EventKind::ModuleDisabled),
        broken.len()
    );

    let mut class = cloth_class()?;
    assert!(scanner.transform(&mut class)?.is_modified());
    Ok(())
}

#[test]
fn test_config_snapshot_round_trip() -> Result<()> {
    let json = r#"{"modules": {"hurt_cam_shake": {"enabled": true, "options": {"multiplier": 0.5}}}}"#;
    let snapshot = ConfigSnapshot::from_json(json)?;
    let registry = ModuleRegistry::from_config(&snapshot);

    assert!(registry.is_enabled(ModuleId::HurtCamShake));
    assert_eq!(registry.module(ModuleId::HurtCamShake).float("multiplier")?, 0.5);
    assert_eq!(ConfigSnapshot::from_json(&snapshot.to_json()?)?, snapshot);
    Ok(())
}

#[test]
fn test_malformed_config_is_rejected() {
    assert!(matches!(
        ModuleRegistry::from_json(r#"{"modules": []}"#),
        Err(Error::Config(_))
    ));
}
