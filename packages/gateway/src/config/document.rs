//! Startup loading of the document mode

use pushgate_engine::{DocumentMode, EngineResult, JsonLdContext, OpenApiDocument};

use super::types::GatewayConfig;

impl GatewayConfig {
    /// Load the relation detection mode the configuration selects
    ///
    /// An OpenAPI file selects OpenAPI links; otherwise JSON-LD semantics
    /// apply, with the optional context file used for selector matching.
    ///
    /// # Errors
    ///
    /// Returns an `EngineError` when a configured file cannot be read or
    /// parsed.
    pub fn load_document_mode(&self) -> EngineResult<DocumentMode> {
        if let Some(path) = &self.openapi_file {
            let document = OpenApiDocument::from_path(path)?;
            tracing::info!(
                path = %path.display(),
                routes = document.route_count(),
                base_path = document.base_path(),
                "loaded OpenAPI description"
            );
            return Ok(DocumentMode::OpenApi(document));
        }

        let context = match &self.jsonld_context_file {
            Some(path) => {
                let context = JsonLdContext::from_path(path)?;
                tracing::info!(path = %path.display(), "loaded JSON-LD context");
                context
            }
            None => JsonLdContext::default(),
        };

        Ok(DocumentMode::JsonLd(context))
    }
}
