//! Module loading without a Python interpreter.

use crate::lang_python::PythonDecomposer;
use litpost_core::{InertNamespace, LoadError, LoadedModule, ModuleLoader};
use std::path::Path;

/// Reads metadata attributes straight from the literal assignments in the
/// source. Examples cannot run, so posts keep their recorded output.
pub struct StaticLoader {
    decomposer: PythonDecomposer,
    names: Vec<String>,
}

impl StaticLoader {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            decomposer: PythonDecomposer::new(),
            names,
        }
    }
}

impl ModuleLoader for StaticLoader {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self, _path: &Path, source: &str) -> Result<LoadedModule, LoadError> {
        let attributes = self
            .decomposer
            .metadata_literals(source, &self.names)
            .map_err(|e| LoadError::Module(e.to_string()))?;
        Ok(LoadedModule {
            attributes,
            namespace: Box::new(InertNamespace),
        })
    }
}
