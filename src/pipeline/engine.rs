//! pdfium binding.
//!
//! pdfium is a shared library loaded at runtime. Lookup order:
//!
//! 1. `ServiceConfig::pdfium_library_path`, when set
//! 2. the current working directory and `./lib`
//! 3. the directory of the running executable
//! 4. the system library path
//!
//! A fresh [`Pdfium`] is bound per blocking task; the `thread_safe` feature
//! of `pdfium-render` serialises calls into the library.

use crate::config::ServiceConfig;
use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Bind to a pdfium library following the lookup order above.
pub fn bind(config: &ServiceConfig) -> Result<Pdfium, ConvertError> {
    if let Some(ref dir) = config.pdfium_library_path {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .map_err(|e| {
                ConvertError::PdfiumBindingFailed(format!("{}: {:?}", dir.display(), e))
            })?;
        debug!("Bound pdfium from {}", dir.display());
        return Ok(Pdfium::new(bindings));
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./lib")))
        .or_else(|e| match exe_dir {
            Some(ref dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Err(e),
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Whether a pdfium library can be bound with this configuration.
pub fn is_available(config: &ServiceConfig) -> bool {
    bind(config).is_ok()
}

/// Map a pdfium error on `path` to [`ConvertError::Pdf`].
pub(crate) fn pdf_error(path: &Path, e: PdfiumError) -> ConvertError {
    ConvertError::Pdf {
        path: path.to_path_buf(),
        detail: format!("{:?}", e),
    }
}
