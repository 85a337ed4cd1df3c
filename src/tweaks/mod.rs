//! The default tweak set.
//!
//! Each tweak locates its target by content (string literals, constants, calls and field
//! accesses) since the host application is obfuscated and renamed between releases. Every
//! tweak is guarded by its [`crate::module::ModuleId`], so a disabled module contributes no
//! registration at all.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use classpatch::{module::{ModuleId, ModuleRegistry}, tweaks};
//!
//! let mut registry = ModuleRegistry::new();
//! registry.enable(ModuleId::RemoveProfilesCap).enable(ModuleId::ClothCapes);
//!
//! let scanner = tweaks::default_scanner(Arc::new(registry));
//! assert_eq!(scanner.registrations().len(), 2);
//! assert!(scanner.issues().is_empty());
//! ```

mod gameplay;
mod network;
mod strings;

use std::sync::Arc;

use crate::{
    module::ModuleRegistry,
    scanner::{Scanner, ScannerBuilder},
};

/// Registers every default tweak, in a fixed order.
pub fn install_tweaks(builder: &mut ScannerBuilder) {
    strings::install(builder);
    network::install(builder);
    gameplay::install(builder);
}

/// Builds a scanner carrying the default tweaks for `registry`.
#[must_use]
pub fn default_scanner(registry: Arc<ModuleRegistry>) -> Scanner {
    let mut builder = ScannerBuilder::new(registry);
    install_tweaks(&mut builder);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::{analyze_stack, opcodes, Instruction},
        classfile::Constant,
        module::ModuleId,
        test::{factories::*, registry_with},
        Error,
    };

    fn calls_named(class: &crate::classfile::ClassRecord, method: &str, name: &str) -> usize {
        class
            .method(method)
            .unwrap()
            .calls()
            .filter(|call| call.name == name)
            .count()
    }

    #[test]
    fn test_fps_text_replaced() {
        let mut registry = ModuleRegistry::new();
        registry
            .enable(ModuleId::ChangeModStrings)
            .set_option(ModuleId::ChangeModStrings, "fps_text", "CPS");
        let scanner = default_scanner(Arc::new(registry));

        let mut class = fps_mod_class();
        let report = scanner.transform(&mut class).unwrap();
        assert_eq!(report.transformed, vec!["getText()Ljava/lang/String;"]);

        let text = class.method("getText").unwrap();
        assert!(text.strings().any(|s| s == "\u{1} CPS"));
        assert!(!text.strings().any(|s| s == "\u{1} FPS"));
        assert_eq!(
            class.method("getId").unwrap().instructions[0],
            Instruction::Ldc("fps".into())
        );
    }

    #[test]
    fn test_fps_spoof_scales_counter() {
        let mut registry = ModuleRegistry::new();
        registry
            .enable(ModuleId::FpsSpoof)
            .set_option(ModuleId::FpsSpoof, "multiplier", 2.5);
        let scanner = default_scanner(Arc::new(registry));

        let mut class = fps_mod_class();
        scanner.transform(&mut class).unwrap();

        let text = class.method("getText").unwrap();
        let call = text
            .instructions
            .iter()
            .position(|insn| insn.as_method().is_some_and(|m| m.name == "bridge$getDebugFPS"))
            .unwrap();
        assert_eq!(text.instructions[call + 1], Instruction::Simple(opcodes::I2F));
        assert_eq!(text.instructions[call + 2], Instruction::Ldc(Constant::Float(2.5)));
        assert_eq!(text.instructions[call + 3], Instruction::Simple(opcodes::FMUL));
        assert_eq!(text.instructions[call + 4], Instruction::Simple(opcodes::F2I));
        assert!(text.strings().any(|s| s == "\u{1} FPS"));
        assert_eq!(text.max_stack, analyze_stack(text).unwrap().max_stack);
    }

    #[test]
    fn test_profiles_cap_lifted() {
        let scanner = default_scanner(registry_with(&[ModuleId::RemoveProfilesCap]));
        let mut class = profile_manager_class();
        scanner.transform(&mut class).unwrap();

        let method = class.method("handleNewProfile").unwrap();
        assert!(method.constants().any(|c| c == Constant::Int(i32::MAX)));
        assert!(!method.constants().any(|c| c == Constant::Int(8)));
    }

    #[test]
    fn test_store_button_removed_on_every_exit() {
        let scanner = default_scanner(registry_with(&[ModuleId::RemoveStoreButton]));
        let mut class = main_menu_class();
        let report = scanner.transform(&mut class).unwrap();
        assert!(report.failures.is_empty(), "{:?}", report.failures);

        assert_eq!(calls_named(&class, "<init>", "remove"), 2);
        let init = class.method("<init>").unwrap();
        let analysis = analyze_stack(init).unwrap();
        assert!(init.max_stack >= analysis.max_stack);
        for (index, insn) in init.instructions.iter().enumerate() {
            if insn.is_return() {
                assert_eq!(init.instructions[index - 1], Instruction::Simple(opcodes::POP));
                assert_eq!(analysis.depth_at(index), Some(0));
            }
        }
    }

    #[test]
    fn test_websocket_url_redirected() {
        let mut registry = ModuleRegistry::new();
        registry
            .enable(ModuleId::WebsocketUrl)
            .set_option(ModuleId::WebsocketUrl, "url", "ws://localhost:8080");
        let scanner = default_scanner(Arc::new(registry));

        let mut class = websocket_class();
        scanner.transform(&mut class).unwrap();

        let init = class.method("<init>").unwrap();
        let call = init
            .calls()
            .position(|call| call.owner == "java/net/URI")
            .unwrap();
        assert_eq!(call, 0);
        let strings: Vec<&str> = init.strings().collect();
        assert_eq!(
            strings,
            vec![
                "wss://assetserver.lunarclientprod.com/connect",
                "ws://localhost:8080",
                "Assets"
            ]
        );
        assert!(analyze_stack(init).is_ok());
    }

    #[test]
    fn test_websocket_without_url_is_disabled() {
        let scanner = default_scanner(registry_with(&[ModuleId::WebsocketUrl]));
        assert!(scanner.registrations().is_empty());
        assert!(matches!(
            scanner.issues(),
            [Error::ModuleConfig {
                module: ModuleId::WebsocketUrl,
                ..
            }]
        ));
    }

    #[test]
    fn test_discord_presence_hooked() {
        let mut registry = ModuleRegistry::new();
        registry
            .enable(ModuleId::DiscordRichPresence)
            .set_option(ModuleId::DiscordRichPresence, "hook_owner", "host.Presence")
            .set_option(ModuleId::DiscordRichPresence, "client_id", "1234");
        let scanner = default_scanner(Arc::new(registry));

        let mut class = discord_ipc_class();
        let report = scanner.transform(&mut class).unwrap();
        assert!(report.failures.is_empty(), "{:?}", report.failures);

        let update = class.method("updateRPC").unwrap();
        assert!(update
            .calls()
            .any(|call| call.owner == "host/Presence" && call.name == "updateRichPresence"));
        assert!(update.calls().any(|call| call.name == "sendRichPresence"));
        assert!(!update.strings().any(|s| s == "Lunar Client"));
        assert!(analyze_stack(update).is_ok());

        let init = class.method("<init>").unwrap();
        assert!(init.constants().any(|c| c == Constant::Long(1234)));
    }

    #[test]
    fn test_level_head_is_constant() {
        let scanner = default_scanner(registry_with(&[ModuleId::RemoveFakeLevelHead]));
        let mut class = level_head_class();
        scanner.transform(&mut class).unwrap();

        assert_eq!(calls_named(&class, "showLevelHead", "current"), 0);
        assert_eq!(calls_named(&class, "showLevelHead", "nextInt"), 0);
        let method = class.method("showLevelHead").unwrap();
        assert!(method.constants().any(|c| c == Constant::Int(-26)));
        assert!(analyze_stack(method).is_ok());
    }

    #[test]
    fn test_nothing_enabled_changes_nothing() {
        let scanner = default_scanner(Arc::new(ModuleRegistry::new()));
        let mut class = fps_mod_class();
        let before = class.methods.clone();
        let report = scanner.transform(&mut class).unwrap();
        assert!(!report.is_modified());
        assert_eq!(
            class.methods.iter().map(|m| &m.instructions).collect::<Vec<_>>(),
            before.iter().map(|m| &m.instructions).collect::<Vec<_>>()
        );
    }
}
