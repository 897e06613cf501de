//! Workflow documents and the sources they are loaded from
//!
//! A [`WorkflowDocument`] is a well-formed XML document (normally a t2flow file)
//! reduced to its root element. Parsing only checks well-formedness; what the
//! workflow means is the server's business.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;
use tracing::debug;

use crate::error::TavernaError;

/// Namespace of Taverna 2 workflow documents
pub const T2FLOW_NAMESPACE: &str = "http://taverna.sf.net/2008/xml/t2flow";

/// Namespace implicitly bound to the `xml` prefix
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Why a workflow document could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowParseError {
    #[error("document is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("document has no root element")]
    NoRootElement,

    #[error("document has more than one root element")]
    MultipleRootElements,

    #[error("unexpected text outside the root element")]
    TextOutsideRoot,

    #[error("document ended with {open} unclosed element(s)")]
    UnclosedElements { open: usize },

    #[error("undeclared namespace prefix '{prefix}' at byte {position}")]
    UnboundPrefix { prefix: String, position: usize },
}

/// Parsed workflow document.
///
/// Holds the text of the root element (without XML declaration or prolog) plus
/// a structural fingerprint used to compare documents independently of
/// formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDocument {
    xml: String,
    root_name: String,
    namespace: Option<String>,
    fingerprint: Vec<String>,
}

impl WorkflowDocument {
    /// Parse XML text into a workflow document.
    ///
    /// Every namespace prefix used on an element or attribute must be declared
    /// within the document.
    pub fn parse(text: &str) -> Result<Self, WorkflowParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = NsReader::from_str(text);

        let mut depth = 0usize;
        let mut root: Option<(String, Option<String>)> = None;
        let mut span_start = 0usize;
        let mut span_end: Option<usize> = None;
        let mut fingerprint = Vec::new();

        loop {
            let event_start = reader.buffer_position() as usize;
            let (namespace, event) = match reader.read_resolved_event() {
                Ok((resolved, event)) => (namespace_of(resolved, event_start), event),
                Err(e) => {
                    return Err(WorkflowParseError::Syntax {
                        position: event_start,
                        message: e.to_string(),
                    })
                }
            };
            let namespace = namespace?;

            match event {
                Event::Start(start) => {
                    if depth == 0 {
                        if root.is_some() {
                            return Err(WorkflowParseError::MultipleRootElements);
                        }
                        root = Some((qualified_name(&start), namespace.clone()));
                        span_start = event_start;
                    }
                    fingerprint.push(open_tag_fingerprint(
                        &reader,
                        &start,
                        namespace.as_deref(),
                        event_start,
                    )?);
                    depth += 1;
                }
                Event::End(end) => {
                    if depth == 0 {
                        return Err(WorkflowParseError::Syntax {
                            position: event_start,
                            message: "unmatched closing tag".to_string(),
                        });
                    }
                    depth -= 1;
                    fingerprint.push(format!(
                        "/{}",
                        expanded_name(namespace.as_deref(), end.local_name().as_ref())
                    ));
                    if depth == 0 {
                        span_end = Some(reader.buffer_position() as usize);
                    }
                }
                Event::Empty(start) => {
                    if depth == 0 {
                        if root.is_some() {
                            return Err(WorkflowParseError::MultipleRootElements);
                        }
                        root = Some((qualified_name(&start), namespace.clone()));
                        span_start = event_start;
                        span_end = Some(reader.buffer_position() as usize);
                    }
                    fingerprint.push(open_tag_fingerprint(
                        &reader,
                        &start,
                        namespace.as_deref(),
                        event_start,
                    )?);
                    fingerprint.push(format!(
                        "/{}",
                        expanded_name(namespace.as_deref(), start.local_name().as_ref())
                    ));
                }
                Event::Text(content) => {
                    let content = content.unescape().map_err(|e| WorkflowParseError::Syntax {
                        position: event_start,
                        message: e.to_string(),
                    })?;
                    let trimmed = content.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if depth == 0 {
                        return Err(WorkflowParseError::TextOutsideRoot);
                    }
                    fingerprint.push(format!("#{}", trimmed));
                }
                Event::CData(content) => {
                    if depth == 0 {
                        return Err(WorkflowParseError::TextOutsideRoot);
                    }
                    fingerprint.push(format!("#{}", String::from_utf8_lossy(&content)));
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if depth > 0 {
            return Err(WorkflowParseError::UnclosedElements { open: depth });
        }
        let (root_name, namespace) = root.ok_or(WorkflowParseError::NoRootElement)?;
        let span_end = span_end.ok_or(WorkflowParseError::NoRootElement)?;
        let xml = text
            .get(span_start..span_end)
            .ok_or(WorkflowParseError::Syntax {
                position: span_start,
                message: "root element is not on a character boundary".to_string(),
            })?
            .to_string();

        debug!(root = %root_name, bytes = xml.len(), "Parsed workflow document");

        Ok(Self {
            xml,
            root_name,
            namespace,
            fingerprint,
        })
    }

    /// Parse raw bytes (must be UTF-8).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WorkflowParseError> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| WorkflowParseError::Encoding(e.to_string()))?;
        Self::parse(text)
    }

    /// Read and parse a local workflow file.
    pub async fn read_from(path: impl AsRef<Path>) -> Result<Self, TavernaError> {
        WorkflowSource::File(path.as_ref().to_path_buf()).load().await
    }

    /// Root element text, ready to embed in a request
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Qualified name of the root element
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Root element name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.root_name
            .rsplit_once(':')
            .map_or(self.root_name.as_str(), |(_, local)| local)
    }

    /// Namespace the root element belongs to
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Structural equality over namespace-resolved names: ignores prefixes,
    /// namespace declarations, whitespace-only text, comments and attribute
    /// order.
    pub fn same_workflow(&self, other: &WorkflowDocument) -> bool {
        self.fingerprint == other.fingerprint
    }
}

fn namespace_of(
    resolved: ResolveResult<'_>,
    position: usize,
) -> Result<Option<String>, WorkflowParseError> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Ok(Some(String::from_utf8_lossy(namespace.as_ref()).into_owned()))
        }
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) if prefix == b"xml" => Ok(Some(XML_NAMESPACE.to_string())),
        ResolveResult::Unknown(prefix) => Err(WorkflowParseError::UnboundPrefix {
            prefix: String::from_utf8_lossy(&prefix).into_owned(),
            position,
        }),
    }
}

fn qualified_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// `{namespace}local`, or just `local` outside any namespace
fn expanded_name(namespace: Option<&str>, local: &[u8]) -> String {
    let local = String::from_utf8_lossy(local);
    match namespace {
        Some(namespace) => format!("{{{}}}{}", namespace, local),
        None => local.into_owned(),
    }
}

fn is_namespace_declaration(key: &[u8]) -> bool {
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

fn open_tag_fingerprint(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Option<&str>,
    position: usize,
) -> Result<String, WorkflowParseError> {
    let syntax = |message: String| WorkflowParseError::Syntax { position, message };

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax(e.to_string()))?;
        if is_namespace_declaration(attr.key.as_ref()) {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let attr_namespace = namespace_of(resolved, position)?;
        let value: Cow<'_, str> = attr.unescape_value().map_err(|e| syntax(e.to_string()))?;
        attrs.push(format!(
            "{}={}",
            expanded_name(attr_namespace.as_deref(), local.as_ref()),
            value
        ));
    }
    attrs.sort();

    Ok(format!(
        "<{}|{}",
        expanded_name(namespace, start.local_name().as_ref()),
        attrs.join("|")
    ))
}

/// Where a workflow submitted for run creation comes from
#[derive(Debug, Clone)]
pub enum WorkflowSource {
    /// Already parsed
    Document(WorkflowDocument),
    /// Local file, read and parsed before any remote call
    File(PathBuf),
    /// Raw XML text, parsed before any remote call
    Text(String),
}

impl WorkflowSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Turn the source into a parsed document.
    ///
    /// Read failures surface as [`TavernaError::WorkflowSource`], parse failures
    /// as [`TavernaError::MalformedWorkflow`].
    pub async fn load(self) -> Result<WorkflowDocument, TavernaError> {
        match self {
            WorkflowSource::Document(document) => Ok(document),
            WorkflowSource::Text(text) => {
                WorkflowDocument::parse(&text).map_err(|source| TavernaError::MalformedWorkflow {
                    origin: "<inline>".to_string(),
                    source,
                })
            }
            WorkflowSource::File(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| TavernaError::WorkflowSource {
                        path: path.clone(),
                        source,
                    })?;
                WorkflowDocument::from_bytes(&bytes).map_err(|source| {
                    TavernaError::MalformedWorkflow {
                        origin: path.display().to_string(),
                        source,
                    }
                })
            }
        }
    }
}

impl From<WorkflowDocument> for WorkflowSource {
    fn from(document: WorkflowDocument) -> Self {
        Self::Document(document)
    }
}

impl From<PathBuf> for WorkflowSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for WorkflowSource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}
