use std::path::Path;
use std::sync::{Arc, Mutex};

use localfn::errors::Result;
use localfn::registry::FunctionRegistry;
use localfn::types::FunctionDeclaration;

/// In-memory registry whose contents tests can swap between reloads.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    functions: Arc<Mutex<Vec<FunctionDeclaration>>>,
}

impl StaticRegistry {
    pub fn new(functions: Vec<FunctionDeclaration>) -> Self {
        Self {
            functions: Arc::new(Mutex::new(functions)),
        }
    }

    pub fn set(&self, functions: Vec<FunctionDeclaration>) {
        *self.functions.lock().unwrap() = functions;
    }
}

impl FunctionRegistry for StaticRegistry {
    fn read(&self, _root: &Path) -> Result<Vec<FunctionDeclaration>> {
        Ok(self.functions.lock().unwrap().clone())
    }
}
