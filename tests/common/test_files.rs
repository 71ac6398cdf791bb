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


//! Sample upload contents

/// Fake GBA ROM image with a recognizable header
#[allow(dead_code)]
pub fn rom_image(title: &str) -> Vec<u8> {
    let mut rom = vec![0u8; 0xC0];
    // Entry point branch
    rom[..4].copy_from_slice(&[0x2E, 0x00, 0x00, 0xEA]);
    let len = title.len().min(12);
    rom[0xA0..0xA0 + len].copy_from_slice(&title.as_bytes()[..len]);
    rom
}

/// Battery save filled with a byte pattern
#[allow(dead_code)]
pub fn save_image(fill: u8) -> Vec<u8> {
    vec![fill; 0x8000]
}

/// Cheat file with one code per line
#[allow(dead_code)]
pub fn cheat_file(codes: &[&str]) -> Vec<u8> {
    let mut out = String::from("# cheats\n");
    for code in codes {
        out.push_str(code);
        out.push('\n');
    }
    out.into_bytes()
}
