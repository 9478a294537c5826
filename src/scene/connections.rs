//! The connection list.
//!
//! `Connections/*` rows are directed edges between objects, in file
//! order. Order is meaningful: a mesh with several materials or a curve
//! node with separate X/Y/Z curves relies on it, so every query over
//! connections enumerates in insertion order.

use crate::tree::{Element, PropClass, Token};
use crate::util::{Error, Result};

/// Edge kind: object-to-object or object-to-property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    ObjectObject,
    ObjectProperty,
}

/// A directed edge between two objects; `property` names the destination
/// property for `ObjectProperty` edges.
#[derive(Debug, Clone)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub from: u64,
    pub to: u64,
    pub property: Option<Token>,
}

/// Parse `Connections/*`. Malformed rows are structural violations and
/// fatal.
pub(crate) fn parse_connections(root: &Element) -> Result<Vec<Connection>> {
    let Some(container) = root.child("Connections") else {
        return Ok(Vec::new());
    };

    let mut connections = Vec::with_capacity(container.children().len());
    for row in container.children() {
        if !row.has_shape(&[PropClass::Str, PropClass::Int, PropClass::Int]) {
            return Err(Error::invalid("connection row is not (kind, from, to)"));
        }
        let (Some(kind_token), Some(from), Some(to)) = (
            row.property(0).and_then(|p| p.as_token()),
            row.property(1).and_then(|p| p.to_i64().ok()),
            row.property(2).and_then(|p| p.to_i64().ok()),
        ) else {
            return Err(Error::invalid("connection row is not (kind, from, to)"));
        };
        let (from, to) = (from as u64, to as u64);

        let connection = if kind_token == "OO" {
            Connection {
                kind: ConnectionKind::ObjectObject,
                from,
                to,
                property: None,
            }
        } else if kind_token == "OP" {
            let property = row
                .property(3)
                .and_then(|p| p.as_token())
                .cloned()
                .ok_or_else(|| Error::invalid("OP connection names no property"))?;
            Connection {
                kind: ConnectionKind::ObjectProperty,
                from,
                to,
                property: Some(property),
            }
        } else {
            return Err(Error::invalid(format!(
                "unknown connection kind '{kind_token}'"
            )));
        };
        connections.push(connection);
    }
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Property;

    fn row(props: Vec<Property>) -> Element {
        Element {
            id: Token::new(b"C"),
            properties: props,
            children: Vec::new(),
        }
    }

    fn document(rows: Vec<Element>) -> Element {
        Element {
            id: Token::empty(),
            properties: Vec::new(),
            children: vec![Element {
                id: Token::new(b"Connections"),
                properties: Vec::new(),
                children: rows,
            }],
        }
    }

    #[test]
    fn test_oo_and_op_rows() {
        let root = document(vec![
            row(vec![
                Property::String(Token::new(b"OO")),
                Property::I64(10),
                Property::I64(20),
            ]),
            row(vec![
                Property::String(Token::new(b"OP")),
                Property::I64(30),
                Property::I64(10),
                Property::String(Token::new(b"Lcl Translation")),
            ]),
        ]);
        let connections = parse_connections(&root).unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].kind, ConnectionKind::ObjectObject);
        assert_eq!(connections[0].from, 10);
        assert_eq!(connections[0].to, 20);
        assert!(connections[1].property.as_ref().unwrap() == "Lcl Translation");
    }

    #[test]
    fn test_missing_op_property_is_fatal() {
        let root = document(vec![row(vec![
            Property::String(Token::new(b"OP")),
            Property::I64(1),
            Property::I64(2),
        ])]);
        assert!(parse_connections(&root).is_err());
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let root = document(vec![row(vec![
            Property::String(Token::new(b"PP")),
            Property::I64(1),
            Property::I64(2),
        ])]);
        assert!(parse_connections(&root).is_err());
    }

    #[test]
    fn test_no_connections_element() {
        let root = Element::default();
        assert!(parse_connections(&root).unwrap().is_empty());
    }
}
