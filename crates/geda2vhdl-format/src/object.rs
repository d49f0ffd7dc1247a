//! gEDA/Lepton object reader.
//!
//! See <https://lepton-eda.github.io/lepton-manual.html/gEDA-file-format.html>.
//! Every object starts on its own line with a one character tag followed by
//! whitespace separated fields. Some objects own extra lines (text bodies,
//! path data, embedded pictures), and any object may be followed by a `{ }`
//! attribute block. Components may also carry an embedded symbol in `[ ]`.

use std::str::FromStr;

use crate::ParseError;

/// Discriminates objects by their leading tag character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    Version,
    Component,
    Net,
    Bus,
    Pin,
    Text,
    Line,
    Box,
    Circle,
    Arc,
    Path,
    Picture,
    Other(char),
}

impl ObjectKind {
    pub fn from_tag(tag: char) -> Self {
        match tag {
            'v' => ObjectKind::Version,
            'C' => ObjectKind::Component,
            'N' => ObjectKind::Net,
            'U' => ObjectKind::Bus,
            'P' => ObjectKind::Pin,
            'T' => ObjectKind::Text,
            'L' => ObjectKind::Line,
            'B' => ObjectKind::Box,
            'V' => ObjectKind::Circle,
            'A' => ObjectKind::Arc,
            'H' => ObjectKind::Path,
            'G' => ObjectKind::Picture,
            other => ObjectKind::Other(other),
        }
    }

    pub fn tag(&self) -> char {
        match self {
            ObjectKind::Version => 'v',
            ObjectKind::Component => 'C',
            ObjectKind::Net => 'N',
            ObjectKind::Bus => 'U',
            ObjectKind::Pin => 'P',
            ObjectKind::Text => 'T',
            ObjectKind::Line => 'L',
            ObjectKind::Box => 'B',
            ObjectKind::Circle => 'V',
            ObjectKind::Arc => 'A',
            ObjectKind::Path => 'H',
            ObjectKind::Picture => 'G',
            ObjectKind::Other(tag) => *tag,
        }
    }
}

/// A `name=value` attribute attached to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// Line of the `T` object holding the attribute.
    pub line: usize,
}

/// One object of a schematic or symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Object {
    pub kind: ObjectKind,
    /// 1-based line of the object header.
    pub line: usize,
    /// Header fields after the tag.
    pub fields: Vec<String>,
    /// Body lines owned by the object (text of `T`, data of `H`, file of `G`).
    pub text: Vec<String>,
    pub attributes: Vec<Attribute>,
    /// Objects of an embedded symbol (`[ ]` block after a `C`).
    pub embedded: Vec<Object>,
}

impl Object {
    fn new(kind: ObjectKind, line: usize, fields: Vec<String>) -> Self {
        Self {
            kind,
            line,
            fields,
            text: Vec::new(),
            attributes: Vec::new(),
            embedded: Vec::new(),
        }
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Integer header field. Missing and non-numeric fields are errors.
    pub fn int_field(&self, index: usize) -> Result<i64, ParseError> {
        let raw = self.field(index).ok_or(ParseError::MissingField {
            line: self.line,
            kind: self.kind.tag(),
            index,
        })?;
        raw.parse::<i64>().map_err(|_| ParseError::InvalidNumber {
            line: self.line,
            value: raw.to_string(),
        })
    }

    /// Coordinate pair stored in fields `index` and `index + 1`.
    pub fn point(&self, index: usize) -> Result<(i64, i64), ParseError> {
        Ok((self.int_field(index)?, self.int_field(index + 1)?))
    }

    /// Value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Values of every attribute called `name`, in file order.
    pub fn attributes_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.attributes
            .iter()
            .filter(move |attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Body lines joined with newlines.
    pub fn text_string(&self) -> String {
        self.text.join("\n")
    }
}

/// A parsed schematic or symbol file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// Fields of the `v` line, e.g. `20130925 2`.
    pub version: Option<String>,
    pub objects: Vec<Object>,
}

impl Document {
    pub fn objects_of(&self, kind: ObjectKind) -> impl Iterator<Item = &Object> {
        self.objects.iter().filter(move |obj| obj.kind == kind)
    }

    /// Top-level text objects that hold a `name=value` attribute.
    ///
    /// Symbols store their own attributes this way (`generic=...`,
    /// `device=...`).
    pub fn floating_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.objects_of(ObjectKind::Text).filter_map(|obj| {
            let first = obj.text.first()?;
            split_attribute(first)
        })
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input)
    }
}

/// Split `name=value` the way gEDA does: at the first `=`, with a non-empty
/// name that does not end in a space and a non-empty value that does not
/// start with one.
pub fn split_attribute(text: &str) -> Option<(&str, &str)> {
    let (name, value) = text.split_once('=')?;
    if name.is_empty() || value.is_empty() || name.ends_with(' ') || value.starts_with(' ') {
        return None;
    }
    Some((name, value))
}

struct Reader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().collect(),
            pos: 0,
        }
    }

    /// Next raw line with its 1-based number.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line))
    }

    fn take_lines(
        &mut self,
        count: usize,
        opened_at: usize,
        context: &'static str,
    ) -> Result<Vec<String>, ParseError> {
        // `count` is read from the file, not trusted for allocation.
        let mut taken = Vec::new();
        for _ in 0..count {
            let (_, line) = self.next_line().ok_or(ParseError::UnexpectedEof {
                line: opened_at,
                context,
            })?;
            taken.push(line.to_string());
        }
        Ok(taken)
    }

    /// Objects up to the end of input, or up to `close` for an embedded block.
    fn read_objects(&mut self, close: Option<(char, usize)>) -> Result<Vec<Object>, ParseError> {
        let mut objects: Vec<Object> = Vec::new();

        while let Some((line_no, line)) = self.next_line() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }

            match trimmed {
                "{" => {
                    let owner = objects.last_mut().ok_or(ParseError::Orphan {
                        line: line_no,
                        found: '{',
                    })?;
                    let attributes = self.read_attributes(line_no)?;
                    owner.attributes.extend(attributes);
                }
                "[" => {
                    let owner = objects.last_mut().ok_or(ParseError::Orphan {
                        line: line_no,
                        found: '[',
                    })?;
                    owner.embedded = self.read_objects(Some((']', line_no)))?;
                }
                "]" | "}" => {
                    let found = trimmed.chars().next().unwrap_or(']');
                    return match close {
                        Some((expected, _)) if expected == found => Ok(objects),
                        _ => Err(ParseError::Orphan {
                            line: line_no,
                            found,
                        }),
                    };
                }
                _ => objects.push(self.read_object(line_no, trimmed)?),
            }
        }

        match close {
            Some((_, opened_at)) => Err(ParseError::UnexpectedEof {
                line: opened_at,
                context: "embedded symbol",
            }),
            None => Ok(objects),
        }
    }

    fn read_attributes(&mut self, opened_at: usize) -> Result<Vec<Attribute>, ParseError> {
        let mut attributes = Vec::new();

        loop {
            let (line_no, line) = self.next_line().ok_or(ParseError::UnexpectedEof {
                line: opened_at,
                context: "attribute block",
            })?;
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == "}" {
                return Ok(attributes);
            }

            let object = self.read_object(line_no, trimmed)?;
            if object.kind != ObjectKind::Text {
                log::debug!("line {line_no}: ignoring non-text object inside attribute block");
                continue;
            }
            let text = object.text_string();
            match split_attribute(&text) {
                Some((name, value)) => attributes.push(Attribute {
                    name: name.to_string(),
                    value: value.to_string(),
                    line: line_no,
                }),
                None => log::debug!("line {line_no}: text '{text}' is not an attribute"),
            }
        }
    }

    fn read_object(&mut self, line_no: usize, line: &str) -> Result<Object, ParseError> {
        let mut chars = line.chars();
        let tag = chars.next().unwrap_or(' ');
        let fields = chars.as_str().split_whitespace().map(String::from).collect();
        let mut object = Object::new(ObjectKind::from_tag(tag), line_no, fields);

        match object.kind {
            ObjectKind::Version => {
                object.text.push(object.fields.join(" "));
            }
            ObjectKind::Text => {
                // File format 1 has no num_lines field: a single line of text.
                let count = if object.fields.len() >= 9 {
                    count_field(&object, 8)?
                } else {
                    1
                };
                object.text = self.take_lines(count, line_no, "text body")?;
            }
            ObjectKind::Path => {
                let count = match object.fields.len() {
                    0 => 0,
                    n => count_field(&object, n - 1)?,
                };
                object.text = self.take_lines(count, line_no, "path data")?;
            }
            ObjectKind::Picture => {
                object.text = self.take_lines(1, line_no, "picture file name")?;
                if object.field(6) == Some("1") {
                    loop {
                        let (_, data) = self.next_line().ok_or(ParseError::UnexpectedEof {
                            line: line_no,
                            context: "embedded picture",
                        })?;
                        if data.trim_end() == "." {
                            break;
                        }
                    }
                }
            }
            _ => {}
        }

        Ok(object)
    }
}

fn count_field(object: &Object, index: usize) -> Result<usize, ParseError> {
    let value = object.int_field(index)?;
    usize::try_from(value).map_err(|_| ParseError::InvalidNumber {
        line: object.line,
        value: value.to_string(),
    })
}

/// Parse a complete schematic or symbol file.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    log::trace!("Reading gEDA objects from {} bytes of input", input.len());
    let objects = Reader::new(input).read_objects(None)?;

    let version = objects
        .iter()
        .find(|obj| obj.kind == ObjectKind::Version)
        .map(|obj| obj.fields.join(" "));
    let objects: Vec<Object> = objects
        .into_iter()
        .filter(|obj| obj.kind != ObjectKind::Version)
        .collect();

    log::trace!("Read {} top-level objects", objects.len());
    Ok(Document { version, objects })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER_SHEET: &str = "v 20130925 2
C 40000 40000 1 0 0 lib-counter.sym
{
T 40300 41200 5 10 1 1 0 0 1
refdes=U1
T 40300 41400 5 10 0 0 0 0 1
generic=width : positive := 8
}
N 41000 40500 42000 40500 4
{
T 41200 40600 5 10 1 1 0 0 1
netname=count
}
N 42000 40500 42000 41500 4
T 45000 45000 9 10 1 0 0 0 2
embedded code
  done <= '1';
";

    #[test]
    fn reads_version_and_objects() {
        let doc = parse(COUNTER_SHEET).unwrap();
        assert_eq!(doc.version.as_deref(), Some("20130925 2"));
        let kinds: Vec<_> = doc.objects.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::Component,
                ObjectKind::Net,
                ObjectKind::Net,
                ObjectKind::Text
            ]
        );
    }

    #[test]
    fn attributes_belong_to_preceding_object() {
        let doc = parse(COUNTER_SHEET).unwrap();
        let component = &doc.objects[0];
        assert_eq!(component.field(5), Some("lib-counter.sym"));
        assert_eq!(component.point(0).unwrap(), (40000, 40000));
        assert_eq!(component.attribute("refdes"), Some("U1"));
        assert_eq!(
            component.attributes_named("generic").collect::<Vec<_>>(),
            vec!["width : positive := 8"]
        );

        assert_eq!(doc.objects[1].attribute("netname"), Some("count"));
        assert!(doc.objects[2].attributes.is_empty());
    }

    #[test]
    fn text_body_spans_num_lines() {
        let doc = parse(COUNTER_SHEET).unwrap();
        let text = &doc.objects[3];
        assert_eq!(text.text_string(), "embedded code\n  done <= '1';");
    }

    #[test]
    fn multi_line_text_may_contain_braces() {
        let input = "T 0 0 9 10 1 0 0 0 3\narchitecture start\n}\n{\nN 0 0 100 0 4\n";
        let doc = parse(input).unwrap();
        assert_eq!(doc.objects.len(), 2);
        assert_eq!(doc.objects[0].text, vec!["architecture start", "}", "{"]);
        assert_eq!(doc.objects[1].kind, ObjectKind::Net);
    }

    #[test]
    fn floating_attributes_of_symbol() {
        let input = "v 20130925 2
P 0 200 300 200 1 0 0
{
T 100 250 5 8 1 1 0 0 1
pinlabel=clock
}
T 0 900 8 10 0 0 0 0 1
generic=width : positive := 8
T 0 1000 8 10 1 0 0 0 1
just a comment
";
        let doc = parse(input).unwrap();
        let floating: Vec<_> = doc.floating_attributes().collect();
        assert_eq!(floating, vec![("generic", "width : positive := 8")]);
    }

    #[test]
    fn embedded_symbol_is_nested() {
        let input = "C 100 100 1 0 0 EMBEDDEDres.sym
[
P 0 0 0 100 1 0 0
{
T 0 0 5 8 0 0 0 0 1
pinlabel=a
}
]
{
T 0 0 5 8 0 0 0 0 1
refdes=R1
}
";
        let doc = parse(input).unwrap();
        assert_eq!(doc.objects.len(), 1);
        let component = &doc.objects[0];
        assert_eq!(component.embedded.len(), 1);
        assert_eq!(component.embedded[0].attribute("pinlabel"), Some("a"));
        assert_eq!(component.attribute("refdes"), Some("R1"));
    }

    #[test]
    fn path_and_picture_bodies_are_skipped() {
        let input = "H 3 10 0 0 -1 -1 0 -1 -1 -1 -1 -1 2
M 0 0
L 100 100
G 0 0 100 100 0 0 1
logo.png
QUJD
.
N 0 0 0 100 4
";
        let doc = parse(input).unwrap();
        assert_eq!(doc.objects.len(), 3);
        assert_eq!(doc.objects[0].text.len(), 2);
        assert_eq!(doc.objects[1].text, vec!["logo.png"]);
        assert_eq!(doc.objects[2].kind, ObjectKind::Net);
    }

    #[test]
    fn unclosed_attribute_block_reports_opening_line() {
        let input = "N 0 0 0 100 4\n{\nT 0 0 5 10 1 1 0 0 1\nnetname=a\n";
        assert_eq!(
            parse(input),
            Err(ParseError::UnexpectedEof {
                line: 2,
                context: "attribute block"
            })
        );
    }

    #[test]
    fn huge_line_count_is_end_of_input() {
        let input = "T 0 0 5 10 1 1 0 0 100000000000000\nhello\n";
        assert_eq!(
            parse(input),
            Err(ParseError::UnexpectedEof {
                line: 1,
                context: "text body"
            })
        );

        let input = "H 3 10 0 0 -1 -1 0 -1 -1 -1 -1 -1 99999999999\nM 0 0\n";
        assert_eq!(
            parse(input),
            Err(ParseError::UnexpectedEof {
                line: 1,
                context: "path data"
            })
        );
    }

    #[test]
    fn first_attribute_of_a_name_wins() {
        let input = "C 0 0 1 0 0 lib-a.sym
{
T 0 0 5 10 0 0 0 0 1
generic=a : natural := 1
T 0 0 5 10 0 0 0 0 1
generic=b : natural := 2
}
";
        let doc = parse(input).unwrap();
        let name = String::from("generic");
        assert_eq!(doc.objects[0].attribute(&name), Some("a : natural := 1"));
        assert_eq!(doc.objects[0].attribute("refdes"), None);
    }

    #[test]
    fn orphan_brace_is_rejected() {
        assert_eq!(
            parse("}\n"),
            Err(ParseError::Orphan { line: 1, found: '}' })
        );
        assert_eq!(
            parse("{\n}\n"),
            Err(ParseError::Orphan { line: 1, found: '{' })
        );
    }

    #[test]
    fn bad_integer_field() {
        let doc = parse("N 0 zero 100 0 4\n").unwrap();
        assert_eq!(
            doc.objects[0].point(0),
            Err(ParseError::InvalidNumber {
                line: 1,
                value: "zero".to_string()
            })
        );
        assert_eq!(
            doc.objects[0].int_field(7),
            Err(ParseError::MissingField {
                line: 1,
                kind: 'N',
                index: 7
            })
        );
    }

    #[test]
    fn split_attribute_rules() {
        assert_eq!(split_attribute("netname=clk"), Some(("netname", "clk")));
        assert_eq!(
            split_attribute("generic=n : natural := 4"),
            Some(("generic", "n : natural := 4"))
        );
        assert_eq!(split_attribute("a <= b"), None);
        assert_eq!(split_attribute("=value"), None);
        assert_eq!(split_attribute("name="), None);
        assert_eq!(split_attribute("plain text"), None);
    }
}
