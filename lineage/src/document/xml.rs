//! PROV-XML serialization.

use super::{Attributes, ProvDocument, QualifiedName};
use crate::errors::ExportError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;

const PROV_NS: &str = "http://www.w3.org/ns/prov#";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

type XmlWriter = Writer<Vec<u8>>;

fn ser_err(e: impl Display) -> ExportError {
    ExportError::Serialization(e.to_string())
}

pub(super) fn write_prov_xml(doc: &ProvDocument) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(ser_err)?;

    let mut root = BytesStart::new("prov:document");
    root.push_attribute(("xmlns:prov", PROV_NS));
    root.push_attribute(("xmlns:xsd", XSD_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    for (prefix, uri) in doc.namespaces() {
        root.push_attribute((format!("xmlns:{prefix}").as_str(), uri.as_str()));
    }
    writer.write_event(Event::Start(root)).map_err(ser_err)?;

    for (id, attributes) in doc.entities() {
        write_record(&mut writer, "prov:entity", id, attributes)?;
    }
    for id in doc.activities() {
        write_record(&mut writer, "prov:activity", id, &Attributes::new())?;
    }
    for (id, attributes) in doc.agents() {
        write_record(&mut writer, "prov:agent", id, attributes)?;
    }
    for derivation in doc.derivations() {
        write_relation(
            &mut writer,
            "prov:wasDerivedFrom",
            &[
                ("prov:generatedEntity", &derivation.generated),
                ("prov:usedEntity", &derivation.used),
                ("prov:activity", &derivation.activity),
            ],
        )?;
    }
    for attribution in doc.attributions() {
        write_relation(
            &mut writer,
            "prov:wasAttributedTo",
            &[
                ("prov:entity", &attribution.entity),
                ("prov:agent", &attribution.agent),
            ],
        )?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("prov:document")))
        .map_err(ser_err)?;

    String::from_utf8(writer.into_inner()).map_err(ser_err)
}

fn write_record(
    writer: &mut XmlWriter,
    tag: &str,
    id: &QualifiedName,
    attributes: &Attributes,
) -> Result<(), ExportError> {
    let id = id.to_string();
    let mut start = BytesStart::new(tag);
    start.push_attribute(("prov:id", id.as_str()));

    if attributes.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(ser_err);
    }

    writer.write_event(Event::Start(start)).map_err(ser_err)?;
    for (key, value) in attributes {
        if !key.is_element_name() {
            return Err(ser_err(format_args!("attribute key '{key}' is not an XML name")));
        }
        let key = key.to_string();
        let mut element = BytesStart::new(key.as_str());
        element.push_attribute(("xsi:type", "xsd:string"));
        writer.write_event(Event::Start(element)).map_err(ser_err)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(ser_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(key.as_str())))
            .map_err(ser_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(ser_err)
}

fn write_relation(
    writer: &mut XmlWriter,
    tag: &str,
    refs: &[(&str, &QualifiedName)],
) -> Result<(), ExportError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(ser_err)?;
    for (role, id) in refs {
        let id = id.to_string();
        let mut element = BytesStart::new(*role);
        element.push_attribute(("prov:ref", id.as_str()));
        writer.write_event(Event::Empty(element)).map_err(ser_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(ser_err)
}
