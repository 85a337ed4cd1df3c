//! Synthetic classes shaped like the obfuscated host classes the default tweaks target.
//!
//! Names are made up; what matters is the content the matchers look for.

use crate::{
    assembly::{opcodes, Instruction, Label},
    classfile::{ClassBuilder, ClassRecord, Constant},
};

const LIST: &str = "java/util/List";
const STRING_BUILDER: &str = "java/lang/StringBuilder";
const BUTTON: &str = "com/moonsworth/lunar/a/c/Button";
const IPC_CLIENT: &str = "com/jagrosh/discordipc/IPCClient";

fn load(opcode: u8, index: u16) -> Instruction {
    Instruction::var(opcode, index)
}

fn object_init() -> [Instruction; 2] {
    [
        load(opcodes::ALOAD, 0),
        Instruction::invoke_special("java/lang/Object", "<init>", "()V"),
    ]
}

/// FPS mod HUD element: formats the frame counter into `"\u{1} FPS"`.
pub fn fps_mod_class() -> ClassRecord {
    ClassBuilder::new("com/moonsworth/lunar/a/a/FpsMod")
        .string_constant("[1466 FPS]")
        .method("getText", "()Ljava/lang/String;", |m| {
            m.public().code(vec![
                Instruction::Ldc("\u{1} FPS".into()),
                Instruction::Ldc("\u{1}".into()),
                Instruction::invoke_static("com/moonsworth/lunar/a/b/Bridge", "bridge$getDebugFPS", "()I"),
                Instruction::invoke_static("java/lang/String", "valueOf", "(I)Ljava/lang/String;"),
                Instruction::invoke_virtual(
                    "java/lang/String",
                    "replace",
                    "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Ljava/lang/String;",
                ),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .method("getId", "()Ljava/lang/String;", |m| {
            m.public().code(vec![
                Instruction::Ldc("fps".into()),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .build()
        .unwrap()
}

/// Profile manager refusing a ninth profile.
pub fn profile_manager_class() -> ClassRecord {
    let owner = "com/moonsworth/lunar/a/d/ProfileManager";
    ClassBuilder::new(owner)
        .string_constant("saveNewProfile")
        .field("profiles", "Ljava/util/List;")
        .method("handleNewProfile", "(Ljava/lang/String;)V", |m| {
            m.public().code(vec![
                load(opcodes::ALOAD, 0),
                Instruction::field(opcodes::GETFIELD, owner, "profiles", "Ljava/util/List;"),
                Instruction::invoke_interface(LIST, "size", "()I"),
                Instruction::Int {
                    opcode: opcodes::BIPUSH,
                    operand: 8,
                },
                Instruction::Jump {
                    opcode: opcodes::IF_ICMPLT,
                    target: Label(0),
                },
                Instruction::Simple(opcodes::RETURN),
                Instruction::Label(Label(0)),
                load(opcodes::ALOAD, 0),
                Instruction::field(opcodes::GETFIELD, owner, "profiles", "Ljava/util/List;"),
                Instruction::Ldc("profile".into()),
                Instruction::invoke_interface(LIST, "add", "(Ljava/lang/Object;)Z"),
                Instruction::Simple(opcodes::POP),
                Instruction::Simple(opcodes::RETURN),
            ])
        })
        .build()
        .unwrap()
}

/// Asset websocket connecting to a hard coded URI.
pub fn websocket_class() -> ClassRecord {
    let owner = "com/moonsworth/lunar/a/e/AssetSocket";
    ClassBuilder::new(owner)
        .extends("org/java_websocket/client/WebSocketClient")
        .field("handlers", "Ljava/util/Map;")
        .field("name", "Ljava/lang/String;")
        .method("<init>", "(Ljava/util/Map;)V", |m| {
            m.public().code(vec![
                load(opcodes::ALOAD, 0),
                Instruction::type_insn(opcodes::NEW, "java/net/URI"),
                Instruction::Simple(opcodes::DUP),
                Instruction::Ldc("wss://assetserver.lunarclientprod.com/connect".into()),
                Instruction::invoke_special("java/net/URI", "<init>", "(Ljava/lang/String;)V"),
                load(opcodes::ALOAD, 1),
                Instruction::invoke_special(
                    "org/java_websocket/client/WebSocketClient",
                    "<init>",
                    "(Ljava/net/URI;Ljava/util/Map;)V",
                ),
                load(opcodes::ALOAD, 0),
                Instruction::Ldc("Assets".into()),
                Instruction::field(opcodes::PUTFIELD, owner, "name", "Ljava/lang/String;"),
                Instruction::Simple(opcodes::RETURN),
            ])
        })
        .build()
        .unwrap()
}

/// Main menu constructor creating a store button and leaving through two returns.
pub fn main_menu_class() -> ClassRecord {
    let owner = "com/moonsworth/lunar/a/c/MainMenu";
    let button = |label: &str, field: &str| {
        vec![
            load(opcodes::ALOAD, 0),
            Instruction::type_insn(opcodes::NEW, BUTTON),
            Instruction::Simple(opcodes::DUP),
            Instruction::Ldc(label.into()),
            Instruction::invoke_special(BUTTON, "<init>", "(Ljava/lang/String;)V"),
            Instruction::field(opcodes::PUTFIELD, owner, field, &format!("L{BUTTON};")),
        ]
    };

    let mut body = object_init().to_vec();
    body.extend([
        load(opcodes::ALOAD, 0),
        Instruction::type_insn(opcodes::NEW, "java/util/ArrayList"),
        Instruction::Simple(opcodes::DUP),
        Instruction::invoke_special("java/util/ArrayList", "<init>", "()V"),
        Instruction::field(opcodes::PUTFIELD, owner, "components", "Ljava/util/List;"),
    ]);
    body.extend(button("singleplayer", "singleplayer"));
    body.extend(button("multiplayer", "multiplayer"));
    body.extend(button("store", "store"));
    body.extend([
        load(opcodes::ILOAD, 1),
        Instruction::Jump {
            opcode: opcodes::IFEQ,
            target: Label(0),
        },
        Instruction::Simple(opcodes::RETURN),
        Instruction::Label(Label(0)),
        load(opcodes::ALOAD, 0),
        Instruction::field(opcodes::GETFIELD, owner, "components", "Ljava/util/List;"),
        load(opcodes::ALOAD, 0),
        Instruction::field(opcodes::GETFIELD, owner, "store", &format!("L{BUTTON};")),
        Instruction::invoke_interface(LIST, "add", "(Ljava/lang/Object;)Z"),
        Instruction::Simple(opcodes::POP),
        Instruction::Simple(opcodes::RETURN),
    ]);

    ClassBuilder::new(owner)
        .field("components", "Ljava/util/List;")
        .field("singleplayer", &format!("L{BUTTON};"))
        .field("multiplayer", &format!("L{BUTTON};"))
        .field("store", &format!("L{BUTTON};"))
        .method("<init>", "(Z)V", |m| m.public().code(body))
        .build()
        .unwrap()
}

/// Discord integration holding an IPC client created with the stock application id.
pub fn discord_ipc_class() -> ClassRecord {
    let owner = "com/moonsworth/lunar/a/f/DiscordIPC";
    let client = format!("L{IPC_CLIENT};");

    let mut init = object_init().to_vec();
    init.extend([
        load(opcodes::ALOAD, 0),
        Instruction::type_insn(opcodes::NEW, IPC_CLIENT),
        Instruction::Simple(opcodes::DUP),
        Instruction::Ldc(Constant::Long(562_286_213_059_444_737)),
        Instruction::invoke_special(IPC_CLIENT, "<init>", "(J)V"),
        Instruction::field(opcodes::PUTFIELD, owner, "client", &client),
        Instruction::Simple(opcodes::RETURN),
    ]);

    ClassBuilder::new(owner)
        .string_constant("Connected to Discord IPC")
        .field("client", &client)
        .method("<init>", "()V", |m| m.public().code(init))
        .method("updateRPC", "()V", |m| {
            m.public().code(vec![
                Instruction::Ldc("Lunar Client".into()),
                Instruction::Simple(opcodes::POP),
                Instruction::Simple(opcodes::RETURN),
            ])
        })
        .build()
        .unwrap()
}

/// Level head mod appending a random level to nicked players.
pub fn level_head_class() -> ClassRecord {
    let random = "java/util/concurrent/ThreadLocalRandom";
    ClassBuilder::new("com/moonsworth/lunar/a/a/LevelHead")
        .method("showLevelHead", "()Ljava/lang/String;", |m| {
            m.public().code(vec![
                Instruction::type_insn(opcodes::NEW, STRING_BUILDER),
                Instruction::Simple(opcodes::DUP),
                Instruction::invoke_special(STRING_BUILDER, "<init>", "()V"),
                Instruction::Ldc("Level: ".into()),
                Instruction::invoke_virtual(
                    STRING_BUILDER,
                    "append",
                    "(Ljava/lang/String;)Ljava/lang/StringBuilder;",
                ),
                Instruction::invoke_static(random, "current", &format!("()L{random};")),
                Instruction::Int {
                    opcode: opcodes::BIPUSH,
                    operand: 100,
                },
                Instruction::invoke_virtual(random, "nextInt", "(I)I"),
                Instruction::invoke_virtual(
                    STRING_BUILDER,
                    "append",
                    "(I)Ljava/lang/StringBuilder;",
                ),
                Instruction::invoke_virtual(STRING_BUILDER, "toString", "()Ljava/lang/String;"),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .build()
        .unwrap()
}
