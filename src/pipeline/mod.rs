//! Conversion backends, one module per file format family.
//!
//! Every stage reads from a staged input path and writes to the output path
//! it is handed; staging, naming and atomic persistence live in
//! [`crate::convert`].
//!
//! | Stage | Backend | Used by |
//! |-------|---------|---------|
//! | [`engine`]  | pdfium binding | all pdfium stages |
//! | [`extract`] | pdfium text layer | PDF TO WORD |
//! | [`render`]  | pdfium rasteriser + JPEG encoder | PDF TO IMAGE |
//! | [`compose`] | pdfium document writer | IMAGE TO PDF, TEXT TO PDF |
//! | [`docx`]    | docx-rs      | PDF TO WORD, WORD TO TEXT |
//! | [`office`]  | LibreOffice subprocess | WORD/PPT/EXCEL TO PDF |
//! | [`archive`] | zip | ZIP |
//!
//! All stages except [`office`] are blocking and run inside
//! `spawn_blocking`; pdfium keeps thread-local state and must never be
//! called from an async worker thread.

pub mod archive;
pub mod compose;
pub mod docx;
pub mod engine;
pub mod extract;
pub mod office;
pub mod render;
