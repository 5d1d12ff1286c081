// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media and project files.

pub mod autosave;
pub mod media;
pub mod serialization;
