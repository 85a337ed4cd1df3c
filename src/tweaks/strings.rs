//! Tweaks rewriting text shown by the host: mod HUD labels, the FPS counter and the toggle
//! sprint states.

use crate::{
    assembly::opcodes,
    classfile::{Constant, Type},
    module::ModuleId,
    scanner::ScannerBuilder,
};

const FPS_LITERAL: &str = "\u{1} FPS";

/// `(option, default literal)` of the toggle sprint states.
const SPRINT_STATES: [(&str, &str); 8] = [
    ("flying_text", "flying"),
    ("flying_boost_text", "boost"),
    ("riding_text", "riding"),
    ("descending_text", "descending"),
    ("dismounting_text", "dismounting"),
    ("sneaking_text", "sneaking"),
    ("toggled_text", "toggled"),
    ("sprinting_text", "sprinting"),
];

pub(super) fn install(builder: &mut ScannerBuilder) {
    fps_counter(builder);
    mod_strings(builder);
    toggle_sprint(builder);
}

/// The FPS mod label, shared by `ChangeModStrings` and `FpsSpoof`.
fn fps_counter(builder: &mut ScannerBuilder) {
    builder.find_host_class(|class| {
        class.label("fps_mod");
        class.has_string("[1466 FPS]");
        class.methods(|methods| {
            methods.method("getText", |method| {
                method.has_string(FPS_LITERAL);
                method.transform(|t| {
                    t.with_module(ModuleId::ChangeModStrings, |module, t| {
                        let text = module.text("fps_text")?;
                        t.replace_constant(FPS_LITERAL, format!("\u{1} {text}"));
                        Ok(())
                    })
                    .with_module(ModuleId::FpsSpoof, |module, t| {
                        let multiplier = module.float("multiplier")? as f32;
                        t.advice_after(
                            |call| {
                                call.named("bridge$getDebugFPS");
                            },
                            move |_, fragment| {
                                fragment
                                    .insn(opcodes::I2F)?
                                    .load_constant(multiplier)?
                                    .insn(opcodes::FMUL)?
                                    .insn(opcodes::F2I)?;
                                Ok(())
                            },
                        );
                        Ok(())
                    });
                });
            });
        });
    });
}

fn mod_strings(builder: &mut ScannerBuilder) {
    builder.with_module(ModuleId::ChangeModStrings, |module, scanner| {
        let nickhider = module.text("nickhider_text")?.to_string();
        let cps = module.text("cps_text")?.to_string();
        let auto_gg = module.text("auto_gg_command")?.to_string();
        let level_head = module.text("level_head_text")?.to_string();
        let reach = module.text("reach_text")?.to_string();

        scanner
            .find_host_class(|class| {
                class.label("nick_hider");
                class.has_string("lastKnownHypixelNick");
                class.constant_replacement("You", nickhider.as_str());
            })
            .find_host_class(|class| {
                class.label("cps_mod");
                class.has_string("[16 CPS]");
                class.constant_replacement(" CPS", format!(" {cps}"));
            })
            .find_host_class(|class| {
                class.label("keystrokes_mod");
                class.methods(|methods| {
                    methods
                        .method("constructor", |method| {
                            method.constructor().argument(0, Type::string());
                        })
                        .unnamed_method(|method| {
                            method.has_partial_string("CPS").calls(|call| {
                                call.named("bridge$keybindJump");
                            });
                            method.transform(|t| {
                                t.replace_string("CPS", &cps);
                            });
                        });
                });
            })
            .find_host_class(|class| {
                class.label("hypixel_mod");
                class.has_string("hypixel_mod").has_string("auto_gg");
                class.constant_replacements([
                    (Constant::from("/achat gg"), Constant::from(auto_gg.as_str())),
                    (
                        Constant::from("Level: "),
                        Constant::from(format!("{level_head}: ")),
                    ),
                ]);
            })
            .find_host_class(|class| {
                class.label("reach_display");
                class.has_string("[1.3 blocks]");
                class.constant_replacement("\u{1} blocks", format!("\u{1} {reach}"));
            });
        Ok(())
    });
}

fn toggle_sprint(builder: &mut ScannerBuilder) {
    builder.with_module(ModuleId::ToggleSprintText, |module, scanner| {
        let mut replacements = Vec::with_capacity(SPRINT_STATES.len());
        for (option, literal) in SPRINT_STATES {
            replacements.push((Constant::from(literal), Constant::from(module.text(option)?)));
        }

        scanner.find_host_class(|class| {
            class.label("toggle_sprint_states");
            class.is_enum().has_string("settings").has_string("flying");
            class.constant_replacements(replacements);
        });
        Ok(())
    });
}
