// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use savebridge::core::{
    classify, DirStore, MemFs, MemoryStore, StoreIndex, StoredEntry, SyncEngine,
};
use std::hint::black_box;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn populated_fs(files: usize) -> MemFs {
    let mut fs = MemFs::new();
    fs.mount("/data").unwrap();
    fs.mkdir("/data/saves").unwrap();
    for i in 0..files {
        fs.write_file(&format!("/data/saves/game{}.sav", i), &[0xAB; 1024])
            .unwrap();
    }
    fs
}

fn classify_benchmark(c: &mut Criterion) {
    let names = [
        "Pokemon Emerald.gba",
        "zelda.sav",
        "zelda.ss12",
        "cheats.cheats",
        "readme.txt",
    ];
    c.bench_function("classify", |b| {
        b.iter(|| {
            for name in names {
                let _ = black_box(classify(black_box(name)));
            }
        });
    });
}

fn export_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let rt = runtime();

    for files in [10, 100, 1000] {
        let fs = populated_fs(files);

        // Full export of a fresh tree
        group.bench_with_input(BenchmarkId::new("full", files), &fs, |b, fs| {
            b.iter(|| {
                let mut engine = SyncEngine::new(Arc::new(MemoryStore::new()));
                black_box(rt.block_on(engine.export_to_durable(fs)).unwrap());
            });
        });

        // Nothing dirty: only the scan
        group.bench_with_input(BenchmarkId::new("clean", files), &fs, |b, fs| {
            let mut engine = SyncEngine::new(Arc::new(MemoryStore::new()));
            rt.block_on(engine.export_to_durable(fs)).unwrap();
            b.iter(|| {
                black_box(rt.block_on(engine.export_to_durable(fs)).unwrap());
            });
        });
    }

    group.finish();
}

fn import_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");
    let rt = runtime();

    for files in [10, 100, 1000] {
        let mut index = StoreIndex::new();
        index.insert("/data/saves".to_string(), StoredEntry::directory(0));
        for i in 0..files {
            index.insert(
                format!("/data/saves/game{}.sav", i),
                StoredEntry::file(vec![0xAB; 1024], 0),
            );
        }
        let store = Arc::new(MemoryStore::with_index(index));

        group.bench_with_input(BenchmarkId::from_parameter(files), &store, |b, store| {
            b.iter(|| {
                let mut fs = MemFs::new();
                fs.mount("/data").unwrap();
                let mut engine = SyncEngine::new(store.clone());
                black_box(rt.block_on(engine.import_from_durable(&mut fs)).unwrap());
            });
        });
    }

    group.finish();
}

fn index_codec_benchmark(c: &mut Criterion) {
    let mut index = StoreIndex::new();
    for i in 0..500 {
        index.insert(
            format!("/data/states/game{}.ss1", i),
            StoredEntry::file(vec![0x11; 4096], i),
        );
    }
    let encoded = DirStore::encode_index(&index).unwrap();

    c.bench_function("index_encode", |b| {
        b.iter(|| black_box(DirStore::encode_index(black_box(&index)).unwrap()));
    });

    c.bench_function("index_decode", |b| {
        b.iter(|| black_box(DirStore::decode_index(black_box(&encoded)).unwrap()));
    });
}

criterion_group!(
    benches,
    classify_benchmark,
    export_benchmark,
    import_benchmark,
    index_codec_benchmark
);
criterion_main!(benches);
