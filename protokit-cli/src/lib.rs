//! Descriptor-set adapter for a `protoc` code-generator plugin (§4.7).
//!
//! Turns a [`CodeGeneratorRequest`] into the same `protokit_front::File`
//! AST the text parser would have produced, links it with
//! `protokit_link::link`, and drives `protokit_gen::generate` from the
//! result — the one generator serves both the `.proto`-source pipeline and
//! the `protoc` plugin pipeline.

mod convert;

pub use convert::ConvertError;

use protokit_front::File;
use protokit_gen::Module;
use protokit_types::plugin::{code_generator_response, CodeGeneratorRequest, CodeGeneratorResponse};

/// Runs the full adapter pipeline and always returns a response: a failure
/// anywhere (conversion, linking, or an unresolved/invalid descriptor)
/// becomes `CodeGeneratorResponse.error` with no files, per a `protoc`
/// plugin's error-reporting contract.
pub fn run(request: CodeGeneratorRequest) -> CodeGeneratorResponse {
    match try_run(&request) {
        Ok(file) => CodeGeneratorResponse {
            supported_features: Some(CodeGeneratorResponse::FEATURE_PROTO3_OPTIONAL),
            file,
            ..Default::default()
        },
        Err(message) => CodeGeneratorResponse {
            error: Some(message),
            ..Default::default()
        },
    }
}

fn try_run(request: &CodeGeneratorRequest) -> Result<Vec<code_generator_response::File>, String> {
    let entry_files: Vec<File> = request
        .proto_file
        .iter()
        .map(convert::convert_file)
        .collect::<Result<_, _>>()
        .map_err(|err| {
            log::warn!("descriptor conversion failed: {err}");
            err.to_string()
        })?;

    let mut loader = |path: &str| -> Result<String, String> {
        Err(format!("'{path}' was not present in the descriptor set"))
    };
    let (linked, diagnostics) = protokit_link::link(entry_files, &mut loader);
    if protokit_front::has_errors(&diagnostics) {
        let messages: Vec<String> = diagnostics.iter().filter(|d| d.is_error()).map(|d| d.to_string()).collect();
        log::warn!("descriptor set failed to link: {} error(s)", messages.len());
        return Err(messages.join("\n"));
    }

    let generated = protokit_gen::generate(&linked, &request.file_to_generate);
    Ok(generated
        .into_iter()
        .map(|(module, content)| code_generator_response::File {
            name: Some(output_file_name(&module)),
            content: Some(content),
            ..Default::default()
        })
        .collect())
}

fn output_file_name(module: &Module) -> String {
    format!("{}.rs", module.0.join("."))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use protokit_types::descriptor::{field_descriptor_proto, DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

    use super::*;

    fn simple_request() -> CodeGeneratorRequest {
        CodeGeneratorRequest {
            file_to_generate: vec!["widget.proto".to_string()],
            proto_file: vec![FileDescriptorProto {
                name: Some("widget.proto".to_string()),
                package: Some("widgets.v1".to_string()),
                syntax: Some("proto3".to_string()),
                message_type: vec![DescriptorProto {
                    name: Some("Widget".to_string()),
                    field: vec![FieldDescriptorProto {
                        name: Some("id".to_string()),
                        number: Some(1),
                        r#type: Some(field_descriptor_proto::Type::Uint32 as i32),
                        label: Some(field_descriptor_proto::Label::Optional as i32),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn generates_a_file_for_a_valid_descriptor_set() {
        let response = run(simple_request());
        assert_eq!(response.error, None);
        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name.as_deref(), Some("widgets.v1.rs"));
        assert!(response.file[0].content.as_ref().unwrap().contains("Widget"));
        assert_eq!(response.supported_features, Some(CodeGeneratorResponse::FEATURE_PROTO3_OPTIONAL));
    }

    #[test]
    fn unresolved_reference_is_reported_as_an_error_with_no_files() {
        let mut request = simple_request();
        request.proto_file[0].message_type[0].field.push(FieldDescriptorProto {
            name: Some("missing".to_string()),
            number: Some(2),
            r#type: Some(field_descriptor_proto::Type::Message as i32),
            label: Some(field_descriptor_proto::Label::Optional as i32),
            type_name: Some(".widgets.v1.Nope".to_string()),
            ..Default::default()
        });

        let response = run(request);
        assert!(response.error.is_some());
        assert!(response.file.is_empty());
    }

    #[test]
    fn a_file_absent_from_files_to_generate_is_still_linked_but_not_emitted() {
        let mut request = simple_request();
        request.file_to_generate.clear();
        let response = run(request);
        assert_eq!(response.error, None);
        assert!(response.file.is_empty());
    }
}
