//! Reading a gEDA schematic sheet into the inputs of net aggregation.

use std::path::Path;
use std::str::FromStr;

use geda2vhdl_format::{Document, Object, ObjectKind, ParseError};
use log::{debug, trace};

use crate::aggregate::LabelledWire;
use crate::geometry::{Point, Segment};
use crate::{Component, Signal};

#[derive(Debug, thiserror::Error)]
pub enum SchematicError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("line {line}: component has no symbol file name")]
    MissingBasename { line: usize },

    #[error("failed to read schematic {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a sheet contributes to its architecture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub components: Vec<Component>,
    pub labelled: Vec<LabelledWire>,
    /// Unlabelled wire segments in file order.
    pub fragments: Vec<Segment>,
    /// One signal per wire name, in order of first appearance.
    pub signals: Vec<Signal>,
    /// Free text found on the sheet.
    pub text_blocks: Vec<String>,
}

impl Sheet {
    pub fn from_file(path: &Path) -> Result<Self, SchematicError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchematicError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Reading sheet {}", path.display());
        text.parse()
    }

    pub fn from_document(doc: &Document) -> Result<Self, SchematicError> {
        let mut sheet = Sheet::default();

        for object in &doc.objects {
            match object.kind {
                ObjectKind::Component => sheet.add_component(object)?,
                ObjectKind::Net | ObjectKind::Bus => sheet.add_wire(object)?,
                ObjectKind::Text => sheet.text_blocks.push(object.text_string()),
                _ => trace!("line {}: ignoring '{}' object", object.line, object.kind.tag()),
            }
        }

        debug!(
            "Sheet has {} components, {} labelled wires, {} fragments",
            sheet.components.len(),
            sheet.labelled.len(),
            sheet.fragments.len()
        );
        Ok(sheet)
    }

    fn add_component(&mut self, object: &Object) -> Result<(), SchematicError> {
        let (x, y) = object.point(0)?;
        let basename = object
            .field(5)
            .ok_or(SchematicError::MissingBasename { line: object.line })?;
        let name = basename.strip_suffix(".sym").unwrap_or(basename);

        let component = Component {
            name: name.to_string(),
            label: object.attribute("refdes").unwrap_or_default().to_string(),
            source: object.attribute("source").map(str::to_string),
            generics: object.attributes_named("generic").map(str::to_string).collect(),
            location: Point::new(x, y),
        };
        debug!("Component {} at {}", component.name, component.location);
        self.components.push(component);
        Ok(())
    }

    fn add_wire(&mut self, object: &Object) -> Result<(), SchematicError> {
        let start = Point::from(object.point(0)?);
        let end = Point::from(object.point(2)?);

        let Some(name) = object.attribute("netname") else {
            self.fragments.push(Segment::new(start, end));
            return Ok(());
        };

        self.labelled.push(LabelledWire::new(name, [start, end]));

        let signal_type = object.attribute("signaltype").unwrap_or_default();
        let range = object.attribute("signalrange").unwrap_or_default();
        match self.signals.iter_mut().find(|s| s.name == name) {
            Some(signal) => {
                if signal.signal_type.is_empty() {
                    signal.signal_type = signal_type.to_string();
                }
                if signal.range.is_empty() {
                    signal.range = range.to_string();
                }
            }
            None => self.signals.push(Signal {
                name: name.to_string(),
                signal_type: signal_type.to_string(),
                range: range.to_string(),
            }),
        }
        Ok(())
    }
}

impl FromStr for Sheet {
    type Err = SchematicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let doc = geda2vhdl_format::parse(s)?;
        Sheet::from_document(&doc)
    }
}
