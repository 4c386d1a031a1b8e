use serde_json::{json, Value};
use tree_grafter::cli::{self, CliError, CliOptions, Format};
use tree_grafter::openapi::{combine_all_of, parse_openapi_doc, CombinatorError};
use tree_grafter::{limit_depth, TransformError, Transformation};

const PETSTORE: &str = r##"
openapi: "3.0.0"
paths:
  /pets:
    get:
      responses:
        200:
          content:
            application/json:
              schema:
                $ref: "#/components/schemas/PetList"
components:
  schemas:
    NewPet:
      type: object
      required: [name]
      properties:
        name: {type: string}
        tag: {type: string}
    Pet:
      allOf:
        - $ref: "#/components/schemas/NewPet"
        - required: [id]
          properties:
            id: {type: integer, format: int64}
    PetList:
      type: object
      properties:
        has_more: {type: boolean}
        data:
          type: array
          items:
            $ref: "#/components/schemas/Pet"
"##;

fn yaml(text: &str) -> Value {
    cli::read_document(text, Format::Yaml).unwrap()
}

fn pets_schema(doc: &Value) -> &Value {
    &doc["paths"]["/pets"]["get"]["responses"]["200"]["content"]["application/json"]["schema"]
}

#[test]
fn reference_in_sibling_is_inlined() {
    let doc = json!({"a": {"$ref": "#/b"}, "b": {"x": 1}});
    assert_eq!(
        parse_openapi_doc(&doc).unwrap(),
        json!({"a": {"x": 1}, "b": {"x": 1}})
    );
}

#[test]
fn all_of_is_a_shallow_merge() {
    let pet = json!({
        "type": "object",
        "required": ["id"],
        "properties": {"id": {"type": "integer", "format": "int64"}}
    });
    let out = parse_openapi_doc(&yaml(PETSTORE)).unwrap();
    assert_eq!(out["components"]["schemas"]["Pet"], pet);
    assert_eq!(out["components"]["schemas"]["PetList"]["properties"]["data"]["items"], pet);
    assert_eq!(pets_schema(&out), &out["components"]["schemas"]["PetList"]);
}

#[test]
fn merge_before_resolution_is_rejected() {
    let merge_only = Transformation::new().with(combine_all_of);
    let err = merge_only.apply(&yaml(PETSTORE)).unwrap_err();
    assert!(matches!(
        err,
        TransformError::Combinator(CombinatorError::UnresolvedReference { index: 0, .. })
    ));
}

#[test]
fn no_reference_markers_survive() {
    let out = parse_openapi_doc(&yaml(PETSTORE)).unwrap();
    let leftovers: Vec<_> = tree_grafter::stroll(&out)
        .filter(|(path, _)| {
            path.last()
                .is_some_and(|step| step.is_key("$ref") || step.is_key("allOf"))
        })
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn cli_yaml_round_trip_with_pagination_hidden() {
    let options = CliOptions {
        hide_pagination: true,
        ..CliOptions::default()
    };
    let out = yaml(&cli::run(PETSTORE, &options).unwrap());
    let pet = &out["components"]["schemas"]["Pet"];
    assert_eq!(pets_schema(&out), pet);
    assert_eq!(&out["components"]["schemas"]["PetList"], pet);
    assert_eq!(out["openapi"], json!("3.0.0"));
}

#[test]
fn cli_json_with_nulls_and_depth_limit() {
    let input = r##"{
        "Tag": {"type": "object", "properties": {"label": {"type": "string"}}},
        "Use": {"$ref": "#/Tag"}
    }"##;
    let options = CliOptions {
        format: Format::Json,
        add_nulls: true,
        max_depth: Some(3),
        ..CliOptions::default()
    };
    let out: Value = serde_json::from_str(&cli::run(input, &options).unwrap()).unwrap();
    let truncated = json!({"type": ["null", "object"], "properties": {"label": {}}});
    assert_eq!(out, json!({"Tag": truncated.clone(), "Use": truncated}));
}

#[test]
fn cli_reports_malformed_documents() {
    let options = CliOptions::default();
    assert!(matches!(
        cli::run("a: [unclosed", &options),
        Err(CliError::Yaml(_))
    ));
    assert!(matches!(
        cli::run("a:\n  $ref: other.yaml#/b\n", &options),
        Err(CliError::Transform(TransformError::Reference(_)))
    ));
}

#[test]
fn depth_limit_keeps_container_kinds() {
    let doc = json!({"a": {"b": {"c": 1}}, "l": [[1], [2]]});
    let out = Transformation::new().with(limit_depth(1)).apply(&doc).unwrap();
    assert_eq!(out, json!({"a": {}, "l": []}));
}
