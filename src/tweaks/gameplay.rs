//! Tweaks changing client behaviour: cosmetics, HUD elements, combat and launcher checks.

use crate::{
    assembly::opcodes,
    classfile::Type,
    module::ModuleId,
    scanner::ScannerBuilder,
};

const CALLBACK_INFO: &str = "org/spongepowered/asm/mixin/injection/callback/CallbackInfo";

pub(super) fn install(builder: &mut ScannerBuilder) {
    builder
        .with_module(ModuleId::RemoveFakeLevelHead, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("level_head");
                class.methods(|methods| {
                    methods.method("showLevelHead", |method| {
                        method.has_string("Level: ");
                        method.transform(|t| {
                            // the random source goes away, nextInt then only has its bound to drop
                            t.replace_call(|call| {
                                call.named("current");
                            })
                            .replace_call_with(
                                |call| {
                                    call.named("nextInt");
                                },
                                |_, fragment| {
                                    fragment.insn(opcodes::POP)?.load_constant(-26)?;
                                    Ok(())
                                },
                            );
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::RemoveStoreButton, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("main_menu");
                class.methods(|methods| {
                    methods.method("init", |method| {
                        method
                            .constructor()
                            .has_strings(&["singleplayer", "multiplayer", "store"]);
                        method.transform(|t| {
                            t.method_exit(|context, fragment| {
                                let store = context.find_string("store")?;
                                let button = context
                                    .next_field_after(store, "store button field", |field| {
                                        field.opcode == opcodes::PUTFIELD
                                    })?
                                    .clone();
                                let components = context
                                    .field_reference("component list", |field| {
                                        field.opcode == opcodes::GETFIELD
                                            && field.descriptor == "Ljava/util/List;"
                                    })?
                                    .clone();

                                fragment
                                    .load_this()?
                                    .field(components)?
                                    .load_this()?
                                    .get_field(&button.owner, &button.name, &button.descriptor)?
                                    .invoke_interface(
                                        "java/util/List",
                                        "remove",
                                        "(Ljava/lang/Object;)Z",
                                    )?
                                    .insn(opcodes::POP)?;
                                Ok(())
                            });
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::ClothCapes, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("cloth_capes");
                class.has_string("Refreshed render target textures.");
                class.methods(|methods| {
                    methods.method("checkCloth", |method| {
                        method.returns(Type::Boolean).has_string("LunarPlus");
                        method.transform(|t| {
                            t.fixed_value(true);
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::HurtCamShake, |module, scanner| {
            let multiplier = module.float("multiplier")? as f32;
            scanner.find_platform_class(|class| {
                class.label("hurt_camera");
                class.has_string("Failed to load shader: ");
                class.constant_replacement(14.0f32, 14.0f32 * multiplier);
            });
            Ok(())
        })
        .with_module(ModuleId::RemoveMousePopup, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("polling_rate_popup");
                class.has_string("PollingRateDetectionThread");
                class.methods(|methods| {
                    methods.named_transform("start", |t| {
                        t.stub();
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::RemoveProfilesCap, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("profiles");
                class.has_string("saveNewProfile");
                class.methods(|methods| {
                    methods.method("handleNewProfile", |method| {
                        method.has_string("profile");
                        method.transform(|t| {
                            t.replace_constant(8, i32::MAX);
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::AllowCrackedAccounts, |_, scanner| {
            scanner.find_host_class(|class| {
                class.label("launcher_accounts");
                class.has_string("launcher_accounts.json");
                class.methods(|methods| {
                    methods.method("checkCracked", |method| {
                        method.calls(|call| {
                            call.named("canPlayOnline");
                        });
                        method.transform(|t| {
                            t.fixed_value(true);
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::NoHitDelay, |_, scanner| {
            scanner.find_platform_class(|class| {
                class.label("legacy_combat");
                class.methods(|methods| {
                    methods.method("clickMouseLegacyCombat", |method| {
                        method.references(|field| {
                            field.named("LEGACY_COMBAT");
                        });
                        method.transform(|t| {
                            // woven by mixin, frames are recomputed there
                            t.disable_frame_computing().overwrite(|_, body| {
                                body.load(&Type::object(CALLBACK_INFO), 1)?
                                    .invoke_virtual(CALLBACK_INFO, "cancel", "()V")?
                                    .return_value(&Type::Void)?;
                                Ok(())
                            });
                        });
                    });
                });
            });
            Ok(())
        })
        .with_module(ModuleId::InfiniteEmotes, |_, scanner| {
            scanner.find_named_class("mchorse.emoticons.common.emotes.Emote", |class| {
                class.label("emote");
                class.methods(|methods| {
                    methods.named_transform("shouldStopOnMove", |t| {
                        t.stub();
                    });
                });
            });
            Ok(())
        });
}
