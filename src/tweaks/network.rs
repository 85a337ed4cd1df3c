//! Tweaks redirecting or muting the host's network and launcher integrations.

use crate::{
    assembly::opcodes,
    classfile::Type,
    module::ModuleId,
    scanner::ScannerBuilder,
};

const IPC_CLIENT: &str = "com/jagrosh/discordipc/IPCClient";
const PIPE_STATUS: &str = "com/jagrosh/discordipc/entities/pipe/PipeStatus";
const RICH_PRESENCE: &str = "com/jagrosh/discordipc/entities/RichPresence";
const DEFAULT_DISCORD_CLIENT: i64 = 562_286_213_059_444_737;

/// `(option, metadata section)` pairs; a removed section is renamed so the host skips it.
const METADATA_SECTIONS: [(&str, &str); 5] = [
    ("remove_blog_posts", "blogPosts"),
    ("remove_client_settings", "clientSettings"),
    ("remove_mod_settings", "modSettings"),
    ("remove_server_integration", "serverIntegration"),
    ("remove_pinned_servers", "pinnedServers"),
];

/// Files the host reports on; their packets are dropped.
const PRIVACY_PROBES: [&str; 2] = [
    "\u{1}\\system32\\tasklist.exe",
    "\u{1}\\system32\\drivers\\etc\\hosts",
];

pub(super) fn install(builder: &mut ScannerBuilder) {
    metadata(builder);
    discord_rich_presence(builder);
    privacy(builder);
    websocket(builder);
}

fn metadata(builder: &mut ScannerBuilder) {
    builder.find_host_class(|class| {
        class.label("metadata");
        class.has_string("metadata_fallback.json");
        class.methods(|methods| {
            methods
                .with_module(ModuleId::Metadata, |module, methods| {
                    let mut removed = Vec::new();
                    for (option, section) in METADATA_SECTIONS {
                        if module.boolean(option)? {
                            removed.push(section);
                        }
                    }
                    methods.method("loadActions", |method| {
                        method.has_string("blogPosts");
                        method.transform(|t| {
                            for section in removed {
                                t.replace_constant(section, "xdd");
                            }
                        });
                    });
                    Ok(())
                })
                .with_module(ModuleId::MetadataUrl, |module, methods| {
                    let url = module.text("metadata_url")?.to_string();
                    methods.method("makeRequest", |method| {
                        method.has_string("PROCESSOR_ARCHITECTURE");
                        method.transform(|t| {
                            t.advice_before(
                                |call| {
                                    call.named("create").owner("java/net/URI");
                                },
                                move |_, fragment| {
                                    fragment.insn(opcodes::POP)?.load_constant(url.as_str())?;
                                    Ok(())
                                },
                            );
                        });
                    });
                    Ok(())
                });
        });
    });
}

fn discord_rich_presence(builder: &mut ScannerBuilder) {
    builder.with_module(ModuleId::DiscordRichPresence, |module, scanner| {
        let hook_owner = module.text("hook_owner")?.replace('.', "/");
        let hook_name = module.text("hook_name")?.to_string();
        let client_id = module
            .text("client_id")?
            .trim()
            .parse::<i64>()
            .unwrap_or(DEFAULT_DISCORD_CLIENT);

        scanner.find_host_class(|class| {
            class.label("discord_ipc");
            class.has_string("Connected to Discord IPC");
            class.methods(|methods| {
                methods
                    .method("updateRPC", |method| {
                        method.has_string("Lunar Client");
                        method.transform(|t| {
                            t.overwrite(move |context, body| {
                                let client = context
                                    .class_field("IPC client field", |field| {
                                        field.descriptor == format!("L{IPC_CLIENT};")
                                    })?
                                    .getter();
                                let connected = body.new_label();

                                body.load_this()?
                                    .field(client.clone())?
                                    .invoke_virtual(
                                        IPC_CLIENT,
                                        "getStatus",
                                        &format!("()L{PIPE_STATUS};"),
                                    )?
                                    .get_static(PIPE_STATUS, "CONNECTED", &format!("L{PIPE_STATUS};"))?
                                    .jump(opcodes::IF_ACMPEQ, connected)?
                                    .return_value(&Type::Void)?
                                    .mark(connected)?
                                    .load_this()?
                                    .field(client)?
                                    .invoke_static(&hook_owner, &hook_name, "()Ljava/lang/Object;")?
                                    .cast(RICH_PRESENCE)?
                                    .invoke_virtual(
                                        IPC_CLIENT,
                                        "sendRichPresence",
                                        &format!("(L{RICH_PRESENCE};)V"),
                                    )?
                                    .return_value(&Type::Void)?;
                                Ok(())
                            });
                        });
                    })
                    .method("init", |method| {
                        method.constructor();
                        method.transform(|t| {
                            t.replace_constant(DEFAULT_DISCORD_CLIENT, client_id);
                        });
                    });
            });
        });
        Ok(())
    });
}

fn privacy(builder: &mut ScannerBuilder) {
    builder.with_module(ModuleId::Privacy, |_, scanner| {
        for probe in PRIVACY_PROBES {
            scanner.find_host_class(|class| {
                class.label(&format!("privacy {}", probe.escape_debug()));
                class.methods(|methods| {
                    methods.method("sendPacket", |method| {
                        method.has_string(probe);
                        method.transform(|t| {
                            t.stub();
                        });
                    });
                });
            });
        }
        Ok(())
    });
}

fn websocket(builder: &mut ScannerBuilder) {
    builder.with_module(ModuleId::WebsocketUrl, |module, scanner| {
        let url = module.text("url")?.to_string();
        scanner.find_host_class(|class| {
            class.label("asset_socket");
            class.extends("org/java_websocket/client/WebSocketClient");
            class.methods(|methods| {
                methods.method("constructor", |method| {
                    method.constructor().has_string("Assets");
                    method.transform(|t| {
                        t.advice_before(
                            |call| {
                                call.constructor().owner("java/net/URI");
                            },
                            move |_, fragment| {
                                fragment.insn(opcodes::POP)?.load_constant(url.as_str())?;
                                Ok(())
                            },
                        );
                    });
                });
            });
        });
        Ok(())
    });
}
