//! SOAP response bodies
//!
//! Results arrive as `<return>` elements inside the operation's response
//! wrapper; each carries either text (run ids, URI schemes, integers) or a
//! single child element (permitted workflows). Element names are matched by
//! local name, so any prefix the server picks is accepted.
//!
//! A captured child element is re-serialized with the namespace declarations
//! it inherits from the envelope, so it stays well-formed on its own.

use std::collections::BTreeMap;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use taverna_core::RemoteError;

/// One `<return>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReturnValue {
    /// Direct text content, trimmed
    pub text: String,
    /// Source text of the first child element, if any
    pub element: Option<String>,
}

/// SOAP 1.1 fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SoapFault {
    pub code: String,
    pub message: String,
    /// Local name of the first element inside `<detail>`
    pub detail: Option<String>,
}

impl SoapFault {
    pub(crate) fn into_remote_error(self) -> RemoteError {
        match self.detail.as_deref() {
            Some("NoCreateException") => RemoteError::NoCreate {
                message: self.message,
            },
            Some("NoUpdateException") => RemoteError::NoUpdate {
                message: self.message,
            },
            _ => RemoteError::Fault {
                code: self.code,
                message: self.message,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SoapResponse {
    Returns(Vec<ReturnValue>),
    Fault(SoapFault),
}

/// Parse a response body.
pub(crate) fn parse(body: &str) -> Result<SoapResponse, RemoteError> {
    let malformed = |e: quick_xml::Error| {
        RemoteError::invalid_response(format!("malformed SOAP response: {e}"))
    };

    let mut reader = Reader::from_str(body);
    let mut scan = Scan::new(body);

    loop {
        let start = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(malformed)?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(element) => scan.open(&Tag::read(&element)?, start),
            Event::Empty(element) => {
                scan.open(&Tag::read(&element)?, start);
                scan.close(end);
            }
            Event::End(_) => scan.close(end),
            Event::Text(text) => scan.text(&text.unescape().map_err(malformed)?),
            Event::CData(data) => scan.text(&String::from_utf8_lossy(&data)),
            Event::Eof => break,
            _ => {}
        }
    }

    scan.finish()
}

/// Prefix (empty for the default namespace) to namespace URI
type Declarations = Vec<(String, String)>;

/// Start tag as seen by the scanner
struct Tag {
    local: String,
    qualified_len: usize,
    declarations: Declarations,
}

impl Tag {
    fn read(element: &BytesStart<'_>) -> Result<Self, RemoteError> {
        let malformed =
            |e: String| RemoteError::invalid_response(format!("malformed SOAP response: {e}"));

        let mut declarations = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| malformed(e.to_string()))?;
            let key = attr.key.as_ref();
            let prefix = if key == b"xmlns" {
                String::new()
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                String::from_utf8_lossy(prefix).into_owned()
            } else {
                continue;
            };
            let uri = attr.unescape_value().map_err(|e| malformed(e.to_string()))?;
            declarations.push((prefix, uri.into_owned()));
        }

        Ok(Self {
            local: String::from_utf8_lossy(element.local_name().as_ref()).into_owned(),
            qualified_len: element.name().as_ref().len(),
            declarations,
        })
    }
}

/// Child element of a `<return>` being captured
struct Child {
    start: usize,
    /// Offset just past the element name in its start tag
    name_end: usize,
    /// Declarations in scope from ancestors and not redeclared on the child
    inherited: BTreeMap<String, String>,
}

impl Child {
    fn render(&self, body: &str, end: usize) -> Option<String> {
        let head = body.get(self.start..self.name_end)?;
        let rest = body.get(self.name_end..end)?;
        let mut element = String::with_capacity(end - self.start);
        element.push_str(head);
        for (prefix, uri) in &self.inherited {
            if prefix.is_empty() {
                element.push_str(&format!(" xmlns=\"{}\"", escape(uri.as_str())));
            } else {
                element.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape(uri.as_str())));
            }
        }
        element.push_str(rest);
        Some(element)
    }
}

struct Capture {
    depth: usize,
    text: String,
    child: Option<Child>,
    element: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FaultField {
    Code,
    Message,
    Detail,
}

struct FaultCapture {
    depth: usize,
    field: Option<FaultField>,
    code: String,
    message: String,
    detail: Option<String>,
}

impl FaultCapture {
    fn open(&mut self, name: &str, depth: usize) {
        if depth == self.depth + 1 {
            self.field = match name {
                "faultcode" => Some(FaultField::Code),
                "faultstring" => Some(FaultField::Message),
                "detail" => Some(FaultField::Detail),
                _ => None,
            };
        } else if depth == self.depth + 2
            && self.field == Some(FaultField::Detail)
            && self.detail.is_none()
        {
            self.detail = Some(name.to_string());
        }
    }

    fn close(&mut self, depth: usize) {
        if depth == self.depth + 1 {
            self.field = None;
        }
    }

    fn text(&mut self, text: &str, depth: usize) {
        if depth != self.depth + 1 {
            return;
        }
        match self.field {
            Some(FaultField::Code) => self.code.push_str(text.trim()),
            Some(FaultField::Message) => self.message.push_str(text.trim()),
            _ => {}
        }
    }
}

struct Scan<'a> {
    body: &'a str,
    depth: usize,
    scopes: Vec<Declarations>,
    saw_body: bool,
    returns: Vec<ReturnValue>,
    current: Option<Capture>,
    fault: Option<FaultCapture>,
}

impl<'a> Scan<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            body,
            depth: 0,
            scopes: Vec::new(),
            saw_body: false,
            returns: Vec::new(),
            current: None,
            fault: None,
        }
    }

    /// Ancestor declarations visible to a new child, minus its own
    fn inherited(&self, own: &Declarations) -> BTreeMap<String, String> {
        let mut in_scope: BTreeMap<String, String> = self.scopes.iter().flatten().cloned().collect();
        for (prefix, _) in own {
            in_scope.remove(prefix);
        }
        in_scope
    }

    fn open(&mut self, tag: &Tag, start: usize) {
        self.depth += 1;
        let depth = self.depth;
        let inherited = match self.current.as_ref() {
            Some(capture) if depth == capture.depth + 1 && capture.child.is_none() => {
                Some(self.inherited(&tag.declarations))
            }
            _ => None,
        };
        self.scopes.push(tag.declarations.clone());

        if let Some(fault) = self.fault.as_mut() {
            fault.open(&tag.local, depth);
            return;
        }
        if let Some(capture) = self.current.as_mut() {
            if let Some(inherited) = inherited {
                capture.child = Some(Child {
                    start,
                    name_end: start + 1 + tag.qualified_len,
                    inherited,
                });
            }
            return;
        }

        match tag.local.as_str() {
            "Body" => self.saw_body = true,
            "Fault" if self.saw_body => {
                self.fault = Some(FaultCapture {
                    depth,
                    field: None,
                    code: String::new(),
                    message: String::new(),
                    detail: None,
                })
            }
            "return" if self.saw_body => {
                self.current = Some(Capture {
                    depth,
                    text: String::new(),
                    child: None,
                    element: None,
                })
            }
            _ => {}
        }
    }

    fn close(&mut self, end: usize) {
        let depth = self.depth;
        self.depth = self.depth.saturating_sub(1);
        self.scopes.pop();

        if let Some(fault) = self.fault.as_mut() {
            fault.close(depth);
            return;
        }

        let finished = match self.current.as_mut() {
            Some(capture) if depth == capture.depth => true,
            Some(capture) => {
                if depth == capture.depth + 1 && capture.element.is_none() {
                    if let Some(child) = capture.child.as_ref() {
                        capture.element = child.render(self.body, end);
                    }
                }
                false
            }
            None => false,
        };

        if finished {
            if let Some(capture) = self.current.take() {
                self.returns.push(ReturnValue {
                    text: capture.text.trim().to_string(),
                    element: capture.element,
                });
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(fault) = self.fault.as_mut() {
            fault.text(text, self.depth);
        } else if let Some(capture) = self.current.as_mut() {
            if self.depth == capture.depth {
                capture.text.push_str(text);
            }
        }
    }

    fn finish(self) -> Result<SoapResponse, RemoteError> {
        if let Some(fault) = self.fault {
            return Ok(SoapResponse::Fault(SoapFault {
                code: fault.code,
                message: fault.message,
                detail: fault.detail,
            }));
        }
        if !self.saw_body {
            return Err(RemoteError::invalid_response("no SOAP Body in response"));
        }
        Ok(SoapResponse::Returns(self.returns))
    }
}
