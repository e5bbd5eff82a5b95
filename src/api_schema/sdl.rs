//! SDL rendering of the generated schema artifact.
//!
//! Output is deterministic: types ordered by name, root fields ordered by
//! name. Used by the CLI `print-sdl` command and the schema tests.

use serde_json::Value;

use super::types::{FieldSpec, InputValueSpec, SchemaType};
use super::ApiSchema;

pub fn render(schema: &ApiSchema) -> String {
    let mut out = String::new();

    out.push_str("schema {\n  query: Query\n");
    if !schema.mutation_fields.is_empty() {
        out.push_str("  mutation: Mutation\n");
    }
    out.push_str("}\n");

    for ty in schema.types.values() {
        out.push('\n');
        render_type(&mut out, ty);
    }

    out.push('\n');
    render_root(&mut out, "Query", &schema.query_fields);
    if !schema.mutation_fields.is_empty() {
        out.push('\n');
        render_root(&mut out, "Mutation", &schema.mutation_fields);
    }

    out
}

fn render_root(out: &mut String, name: &str, fields: &[FieldSpec]) {
    out.push_str(&format!("type {} {{\n", name));
    let mut sorted: Vec<&FieldSpec> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    for field in sorted {
        out.push_str(&format!("  {}\n", render_field(field)));
    }
    out.push_str("}\n");
}

fn render_type(out: &mut String, ty: &SchemaType) {
    match ty {
        SchemaType::Object(object) => {
            let implements = if object.implements.is_empty() {
                String::new()
            } else {
                format!(" implements {}", object.implements.join(" & "))
            };
            out.push_str(&format!("type {}{} {{\n", object.name, implements));
            for field in sorted_fields(&object.fields) {
                out.push_str(&format!("  {}\n", render_field(field)));
            }
            out.push_str("}\n");
        }
        SchemaType::Interface(interface) => {
            out.push_str(&format!("interface {} {{\n", interface.name));
            for field in sorted_fields(&interface.fields) {
                out.push_str(&format!("  {}\n", render_field(field)));
            }
            out.push_str("}\n");
        }
        SchemaType::Union(union) => {
            out.push_str(&format!(
                "union {} = {}\n",
                union.name,
                union.members.join(" | ")
            ));
        }
        SchemaType::Enum(enum_type) => {
            out.push_str(&format!("enum {} {{\n", enum_type.name));
            for value in &enum_type.values {
                out.push_str(&format!("  {}\n", value));
            }
            out.push_str("}\n");
        }
        SchemaType::Scalar(scalar) => {
            out.push_str(&format!("scalar {}\n", scalar.name));
        }
        SchemaType::Input(input) => {
            out.push_str(&format!("input {} {{\n", input.name));
            let mut sorted: Vec<&InputValueSpec> = input.fields.iter().collect();
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            for field in sorted {
                out.push_str(&format!("  {}\n", render_input_value(field)));
            }
            out.push_str("}\n");
        }
    }
}

fn sorted_fields(fields: &[FieldSpec]) -> Vec<&FieldSpec> {
    let mut sorted: Vec<&FieldSpec> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

fn render_field(field: &FieldSpec) -> String {
    if field.arguments.is_empty() {
        return format!("{}: {}", field.name, field.type_ref.to_sdl());
    }
    let mut arguments: Vec<&InputValueSpec> = field.arguments.iter().collect();
    arguments.sort_by(|a, b| a.name.cmp(&b.name));
    let rendered: Vec<String> = arguments.into_iter().map(render_input_value).collect();
    format!(
        "{}({}): {}",
        field.name,
        rendered.join(", "),
        field.type_ref.to_sdl()
    )
}

fn render_input_value(value: &InputValueSpec) -> String {
    match &value.default {
        Some(default) => format!(
            "{}: {} = {}",
            value.name,
            value.type_ref.to_sdl(),
            render_value(default)
        ),
        None => format!("{}: {}", value.name, value.type_ref.to_sdl()),
    }
}

fn render_value(value: &Value) -> String {
    // JSON literals coincide with SDL literals for every default the model
    // can carry (strings, numbers, booleans, lists).
    value.to_string()
}
