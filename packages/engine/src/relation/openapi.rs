//! OpenAPI relations
//!
//! Relations are the OpenAPI 3 Link Objects declared on the `200` (or
//! `default`) response of the operation that served the request:
//!
//! ```yaml
//! paths:
//!   /books/{id}:
//!     get:
//!       responses:
//!         '200':
//!           links:
//!             author:
//!               operationId: getAuthor
//!               parameters:
//!                 id: '$response.body#/author'
//! ```
//!
//! A link applies to a matched node when one of its parameter pointers
//! designates the node's path (`*` in a pointer matches any key or index).
//! The target URL is the linked operation's path template filled with
//! values read from the response body.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use http::Method;
use serde::Deserialize;
use serde_json::Value;

use super::{RelationResolver, Resolution, Route};
use crate::error::{EngineError, EngineResult};
use crate::matcher::{MatchedNode, NodePath, PathSegment};

const BODY_EXPRESSION: &str = "$response.body#";

/// A loaded OpenAPI description, indexed for route and operation lookup
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    base_path: String,
    routes: Vec<RouteEntry>,
    operation_ids: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct RouteEntry {
    template: PathTemplate,
    item: PathItem,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDocument {
    #[serde(default)]
    servers: Vec<Server>,
    #[serde(default)]
    paths: BTreeMap<String, PathItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct Server {
    url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PathItem {
    get: Option<Operation>,
    put: Option<Operation>,
    post: Option<Operation>,
    delete: Option<Operation>,
    patch: Option<Operation>,
    head: Option<Operation>,
    options: Option<Operation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Operation {
    #[serde(rename = "operationId")]
    operation_id: Option<String>,
    #[serde(default)]
    responses: BTreeMap<String, ResponseObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ResponseObject {
    #[serde(default)]
    links: BTreeMap<String, LinkObject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LinkObject {
    #[serde(rename = "operationId")]
    operation_id: Option<String>,
    #[serde(rename = "operationRef")]
    operation_ref: Option<String>,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

/// Where a link parameter takes its value from
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParameterSource {
    /// `$response.body#/a/*/b`, split into unescaped tokens
    Pointer(Vec<String>),
    Constant(String),
}

/// A path template split into literal and `{parameter}` segments
#[derive(Debug, Clone)]
struct PathTemplate {
    raw: String,
    segments: Vec<TemplateSegment>,
}

#[derive(Debug, Clone)]
enum TemplateSegment {
    Literal(String),
    Parameter,
}

impl OpenApiDocument {
    /// Parse an OpenAPI description in YAML or JSON form
    pub fn parse(text: &str) -> EngineResult<Self> {
        let raw: RawDocument = serde_yaml::from_str(text).map_err(EngineError::InvalidOpenApi)?;
        Ok(Self::index(raw))
    }

    /// Load an OpenAPI description file
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        Self::parse(&text)
    }

    /// Path prefix taken from the first `servers` entry, without trailing `/`
    #[inline]
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Number of indexed path templates
    #[inline]
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    fn index(raw: RawDocument) -> Self {
        let base_path = raw
            .servers
            .first()
            .map(|server| server_base_path(&server.url))
            .unwrap_or_default();

        let mut operation_ids = HashMap::new();
        let mut routes = Vec::with_capacity(raw.paths.len());
        for (template, item) in raw.paths {
            for operation in item.operations() {
                if let Some(id) = &operation.operation_id {
                    operation_ids.insert(id.clone(), template.clone());
                }
            }
            routes.push(RouteEntry {
                template: PathTemplate::parse(&template),
                item,
            });
        }

        Self {
            base_path,
            routes,
            operation_ids,
        }
    }

    /// The operation serving `route`, preferring templates with fewer parameters
    fn operation_for(&self, route: &Route<'_>) -> Option<&Operation> {
        let path = route
            .path
            .strip_prefix(self.base_path.as_str())
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(route.path);

        self.routes
            .iter()
            .filter(|entry| entry.template.matches(path))
            .filter_map(|entry| {
                entry
                    .item
                    .operation(route.method)
                    .map(|operation| (entry.template.parameter_count(), operation))
            })
            .min_by_key(|(parameters, _)| *parameters)
            .map(|(_, operation)| operation)
    }

    /// Path template of the operation a link points to
    fn link_template(&self, link: &LinkObject) -> Option<&str> {
        if let Some(id) = &link.operation_id {
            return self.operation_ids.get(id).map(String::as_str);
        }

        let reference = link.operation_ref.as_deref()?.strip_prefix("#/paths/")?;
        let (escaped, _method) = reference.rsplit_once('/')?;
        let template = unescape_token(escaped);
        self.routes
            .iter()
            .find(|entry| entry.template.raw == template)
            .map(|entry| entry.template.raw.as_str())
    }

    fn link_target(&self, link: &LinkObject, node: &MatchedNode<'_>, document: &Value) -> Option<String> {
        let parameters: Vec<(&str, ParameterSource)> = link
            .parameters
            .iter()
            .map(|(name, expression)| ParameterSource::parse(expression).map(|source| (name.as_str(), source)))
            .collect::<Option<_>>()?;

        let applies = parameters.iter().any(|(_, source)| match source {
            ParameterSource::Pointer(tokens) => pointer_matches(tokens, &node.path),
            ParameterSource::Constant(_) => false,
        });
        if !applies {
            return None;
        }

        let mut url = self.link_template(link)?.to_owned();
        for (name, source) in &parameters {
            let value = match source {
                ParameterSource::Constant(value) => value.clone(),
                ParameterSource::Pointer(tokens) if pointer_matches(tokens, &node.path) => {
                    scalar_to_string(node.value)?
                }
                ParameterSource::Pointer(tokens) => {
                    let pointer = concretize(tokens, &node.path)?;
                    scalar_to_string(document.pointer(&pointer)?)?
                }
            };
            url = url.replace(&format!("{{{name}}}"), &urlencoding::encode(&value));
        }

        if url.contains('{') {
            tracing::debug!(template = %url, "link parameters left the path template incomplete");
            return None;
        }

        Some(format!("{}{url}", self.base_path))
    }
}

impl RelationResolver for OpenApiDocument {
    fn resolve(&self, node: &MatchedNode<'_>, document: &Value, route: &Route<'_>) -> Resolution {
        let Some(operation) = self.operation_for(route) else {
            tracing::debug!(method = %route.method, path = route.path, "no OpenAPI operation for route");
            return Resolution::NotARelation;
        };

        let Some(response) = operation
            .responses
            .get("200")
            .or_else(|| operation.responses.get("default"))
        else {
            return Resolution::NotARelation;
        };

        response
            .links
            .values()
            .find_map(|link| self.link_target(link, node, document))
            .map_or(Resolution::NotARelation, Resolution::Relation)
    }
}

impl PathItem {
    fn operation(&self, method: &Method) -> Option<&Operation> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref().or(self.get.as_ref()),
            Method::OPTIONS => self.options.as_ref(),
            _ => None,
        }
    }

    fn operations(&self) -> impl Iterator<Item = &Operation> {
        [
            &self.get,
            &self.put,
            &self.post,
            &self.delete,
            &self.patch,
            &self.head,
            &self.options,
        ]
        .into_iter()
        .flatten()
    }
}

impl ParameterSource {
    fn parse(expression: &Value) -> Option<Self> {
        match expression {
            Value::String(text) => match text.strip_prefix(BODY_EXPRESSION) {
                Some(pointer) => {
                    let tokens = pointer.strip_prefix('/')?.split('/').map(unescape_token).collect();
                    Some(ParameterSource::Pointer(tokens))
                }
                None if text.starts_with('$') => None,
                None => Some(ParameterSource::Constant(text.clone())),
            },
            other => scalar_to_string(other).map(ParameterSource::Constant),
        }
    }
}

impl PathTemplate {
    fn parse(raw: &str) -> Self {
        let segments = raw
            .trim_start_matches('/')
            .split('/')
            .map(|segment| {
                if segment.starts_with('{') && segment.ends_with('}') {
                    TemplateSegment::Parameter
                } else {
                    TemplateSegment::Literal(segment.to_owned())
                }
            })
            .collect();

        Self {
            raw: raw.to_owned(),
            segments,
        }
    }

    fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        parts.len() == self.segments.len()
            && self.segments.iter().zip(&parts).all(|(segment, part)| match segment {
                TemplateSegment::Literal(literal) => literal == part,
                TemplateSegment::Parameter => !part.is_empty(),
            })
    }

    fn parameter_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, TemplateSegment::Parameter))
            .count()
    }
}

fn server_base_path(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_owned(),
        Err(_) => url.to_owned(),
    };
    path.trim_end_matches('/').to_owned()
}

fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn segment_token(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(index) => index.to_string(),
    }
}

/// Whether a pointer token stands for any array index: `*` or a decimal index
fn is_index_token(token: &str) -> bool {
    token == "*" || (!token.is_empty() && token.bytes().all(|byte| byte.is_ascii_digit()))
}

/// Whether pointer tokens designate this path
///
/// `*` matches any step, a numeric token matches any array index.
fn pointer_matches(tokens: &[String], path: &NodePath) -> bool {
    tokens.len() == path.depth()
        && tokens.iter().zip(path.segments()).all(|(token, segment)| {
            token == "*"
                || *token == segment_token(segment)
                || (is_index_token(token) && matches!(segment, PathSegment::Index(_)))
        })
}

/// Replace the index positions of a sibling pointer with the node's concrete steps
fn concretize(tokens: &[String], path: &NodePath) -> Option<String> {
    let mut pointer = String::new();
    for (position, token) in tokens.iter().enumerate() {
        pointer.push('/');
        let step = path.segments().get(position);
        match step {
            Some(segment @ PathSegment::Index(_)) if is_index_token(token) => {
                pointer.push_str(&segment_token(segment));
            }
            Some(segment) if token == "*" => pointer.push_str(&escape_token(&segment_token(segment))),
            None if token == "*" => return None,
            _ => pointer.push_str(&escape_token(token)),
        }
    }
    Some(pointer)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
