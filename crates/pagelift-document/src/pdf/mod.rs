// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — inspecting documents and rendering pages to bitmaps.

pub mod reader;
pub mod render;

pub use reader::PdfReader;
pub use render::{PopplerRasterizer, Rasterizer};
