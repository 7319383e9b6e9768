//! Schema detection for the two known S-1210 layouts.

use crate::core::extract::descendant;
use crate::domain::model::SchemaVariant;
use roxmltree::Document;

pub(crate) const EVENT_WRAPPER_A: &str = "evtPgtos";
pub(crate) const EVENT_WRAPPER_B: &str = "evtIrrfBenef";

/// Pure wrapper-element lookup, no heuristics: a wrong guess here would
/// silently corrupt downstream extraction. The variant-B wrapper takes
/// precedence; a legal document never contains both.
pub fn detect(doc: &Document) -> SchemaVariant {
    let root = doc.root_element();

    if descendant(root, EVENT_WRAPPER_B).is_some() {
        return SchemaVariant::VariantB;
    }
    if descendant(root, EVENT_WRAPPER_A).is_some() {
        return SchemaVariant::VariantA;
    }
    SchemaVariant::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_str(xml: &str) -> SchemaVariant {
        detect(&Document::parse(xml).unwrap())
    }

    #[test]
    fn detects_legacy_wrapper() {
        assert_eq!(
            detect_str("<eSocial><evtPgtos/></eSocial>"),
            SchemaVariant::VariantA
        );
    }

    #[test]
    fn detects_current_wrapper() {
        assert_eq!(
            detect_str("<eSocial><evtIrrfBenef/></eSocial>"),
            SchemaVariant::VariantB
        );
    }

    #[test]
    fn variant_b_takes_precedence() {
        assert_eq!(
            detect_str("<eSocial><evtIrrfBenef/><evtPgtos/></eSocial>"),
            SchemaVariant::VariantB
        );
    }

    #[test]
    fn unknown_wrapper_is_never_guessed() {
        assert_eq!(
            detect_str("<eSocial><evtRemun/></eSocial>"),
            SchemaVariant::Unknown
        );
    }
}
