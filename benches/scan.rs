//! Benchmarks for class scanning.
//!
//! Measures the cost of the default tweak set against a synthetic class pool:
//! - Building the scanner from a configuration document
//! - Scanning classes that no registration matches (the common case)
//! - Scanning and patching a matching class
//! - Parallel batch scans

extern crate classpatch;

use std::{hint::black_box, sync::Arc};

use classpatch::{
    assembly::{opcodes, Instruction},
    classfile::{ClassBuilder, ClassRecord},
    module::ModuleRegistry,
    scanner::Scanner,
    tweaks,
};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

const CONFIG: &str = r#"{
    "modules": {
        "change_mod_strings": { "enabled": true, "options": { "fps_text": "CPS" } },
        "fps_spoof": { "enabled": true, "options": { "multiplier": 2.0 } },
        "remove_profiles_cap": { "enabled": true },
        "cloth_capes": { "enabled": true },
        "privacy": { "enabled": true },
        "toggle_sprint_text": { "enabled": true }
    }
}"#;

fn scanner() -> Scanner {
    let registry = ModuleRegistry::from_json(CONFIG).unwrap();
    tweaks::default_scanner(Arc::new(registry))
}

/// A host class with a handful of string-heavy methods that nothing targets.
fn unrelated_class(index: usize) -> ClassRecord {
    let mut builder = ClassBuilder::new(&format!("com/moonsworth/lunar/z/K{index}"));
    for method in 0..8 {
        builder = builder.method(&format!("m{method}"), "()Ljava/lang/String;", |m| {
            m.code(vec![
                Instruction::Ldc(format!("value {index} {method}").into()),
                Instruction::Ldc("suffix".into()),
                Instruction::invoke_virtual(
                    "java/lang/String",
                    "concat",
                    "(Ljava/lang/String;)Ljava/lang/String;",
                ),
                Instruction::Simple(opcodes::ARETURN),
            ])
        });
    }
    builder.build().unwrap()
}

fn fps_class() -> ClassRecord {
    ClassBuilder::new("com/moonsworth/lunar/z/Fps")
        .string_constant("[1466 FPS]")
        .method("getText", "()Ljava/lang/String;", |m| {
            m.code(vec![
                Instruction::Ldc("\u{1} FPS".into()),
                Instruction::Ldc("\u{1}".into()),
                Instruction::invoke_static("com/moonsworth/lunar/z/B", "bridge$getDebugFPS", "()I"),
                Instruction::invoke_static("java/lang/String", "valueOf", "(I)Ljava/lang/String;"),
                Instruction::invoke_virtual(
                    "java/lang/String",
                    "replace",
                    "(Ljava/lang/CharSequence;Ljava/lang/CharSequence;)Ljava/lang/String;",
                ),
                Instruction::Simple(opcodes::ARETURN),
            ])
        })
        .build()
        .unwrap()
}

fn bench_build_scanner(c: &mut Criterion) {
    c.bench_function("scan_build_default_tweaks", |b| {
        b.iter(|| black_box(scanner()));
    });
}

fn bench_scan_unmatched(c: &mut Criterion) {
    let scanner = scanner();
    let class = unrelated_class(0);

    c.bench_function("scan_unmatched_class", |b| {
        b.iter_batched(
            || class.clone(),
            |mut class| black_box(scanner.transform(&mut class).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

fn bench_scan_patched(c: &mut Criterion) {
    let scanner = scanner();
    let class = fps_class();

    c.bench_function("scan_patch_fps_class", |b| {
        b.iter_batched(
            || class.clone(),
            |mut class| black_box(scanner.transform(&mut class).unwrap()),
            BatchSize::SmallInput,
        );
    });
}

fn bench_scan_pool(c: &mut Criterion) {
    let scanner = scanner();
    let mut pool: Vec<ClassRecord> = (0..256).map(unrelated_class).collect();
    pool.push(fps_class());

    c.bench_function("scan_pool_257_parallel", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| black_box(scanner.transform_all(&mut pool)),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    bench_build_scanner,
    bench_scan_unmatched,
    bench_scan_patched,
    bench_scan_pool
);
criterion_main!(benches);
