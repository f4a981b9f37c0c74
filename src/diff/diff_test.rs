//! Tests for namespace, field and attribute diffs.

#[cfg(test)]
mod tests {
    use crate::diff::{Differ, FieldFinding};
    use crate::document::{LoadedDocument, ReferenceSet, StructuredDocument};
    use crate::namespace::{Layout, Namespace};
    use std::collections::BTreeSet;

    const REFERENCE: &str = r#"openapi: 3.0.0
paths:
  /accounts:
    get:
      parameters:
        - $ref: '#/components/parameters/page'
  /users:
    get: {}
components:
  parameters:
    page:
      name: page
      in: query
    records_per_page:
      name: records_per_page
      in: query
"#;

    const MODELS: &str = r#"Foo:
  type: object
  properties:
    a:
      type: string
    b:
      type: integer
Qux:
  type: object
  properties:
    amount:
      type: number
      nullable: true
      example: 12.5
    currency:
      type: string
      example: USD
"#;

    const TARGET: &str = r#"openapi: 3.0.0
paths:
  /accounts:
    get: {}
  /legacy:
    get: {}
components:
  parameters:
    page:
      name: page
      in: query
  schemas:
    Bar:
      type: object
      properties:
        x:
          type: string
    Qux:
      type: object
      properties:
        amount:
          type: integer
        currency:
          type: string
        legacy_code:
          type: string
"#;

    fn reference() -> ReferenceSet {
        ReferenceSet::new(
            LoadedDocument::from_text("openapi.yaml", REFERENCE.to_string(), Layout::Components)
                .unwrap(),
            Some(
                LoadedDocument::from_text("models.yaml", MODELS.to_string(), Layout::Models)
                    .unwrap(),
            ),
        )
    }

    fn target() -> StructuredDocument {
        StructuredDocument::parse(TARGET, Layout::Components).unwrap()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_namespace() {
        let reference = reference();
        let target = target();
        let diff = Differ::new(&reference, &target).namespace(&Namespace::Schema);

        assert_eq!(diff.missing, set(&["Foo"]));
        assert_eq!(diff.extra, set(&["Bar"]));
        assert_eq!(diff.common, set(&["Qux"]));
    }

    #[test]
    fn test_parameter_and_path_namespaces() {
        let reference = reference();
        let target = target();
        let differ = Differ::new(&reference, &target);

        let params = differ.namespace(&Namespace::Parameter);
        assert_eq!(params.missing, set(&["records_per_page"]));
        assert!(params.extra.is_empty());

        let paths = differ.namespace(&Namespace::Path);
        assert_eq!(paths.missing, set(&["/users"]));
        assert_eq!(paths.extra, set(&["/legacy"]));
        assert_eq!(paths.common, set(&["/accounts"]));
    }

    #[test]
    fn test_fields_only_for_common_schemas() {
        let reference = reference();
        let target = target();
        let fields = Differ::new(&reference, &target).fields();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].namespace, Namespace::Field("Qux".into()));
        assert!(fields[0].missing.is_empty());
        assert_eq!(fields[0].extra, set(&["legacy_code"]));
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let reference = reference();
        let target = target();
        let findings = Differ::new(&reference, &target).field_findings();

        assert!(findings.contains(&FieldFinding::TypeMismatch {
            schema: "Qux".into(),
            field: "amount".into(),
            reference: Some("number".into()),
            target: Some("integer".into()),
        }));
        assert!(findings.contains(&FieldFinding::NullableMismatch {
            schema: "Qux".into(),
            field: "amount".into(),
            reference: true,
            target: false,
        }));
        let examples: Vec<&str> = findings
            .iter()
            .filter(|f| matches!(f, FieldFinding::MissingExample { .. }))
            .map(|f| f.field())
            .collect();
        assert_eq!(examples, vec!["amount", "currency"]);
    }

    #[test]
    fn test_all_is_not_reconciled() {
        let reference = reference();
        let target = target();
        let all = Differ::new(&reference, &target).all();
        assert!(!all.is_reconciled());
        assert!(all.to_string().contains("+ Foo"));
    }

    #[test]
    fn test_identical_documents_are_reconciled() {
        let main =
            LoadedDocument::from_text("openapi.yaml", TARGET.to_string(), Layout::Components)
                .unwrap();
        let reference = ReferenceSet::new(main, None);
        let target = target();
        let all = Differ::new(&reference, &target).all();
        assert!(all.is_reconciled());
        assert!(all.findings.is_empty());
    }
}
