use std::collections::HashMap;
use std::sync::Arc;

use protokit_types::descriptor::{DescriptorProto, FileDescriptorSet};

use crate::dynamic_message::DynamicMessage;

/// A name-indexed view over a linked descriptor set, resolving the
/// `type_name` references message- and map-typed fields carry. Built once
/// per schema and shared (via `Arc`) by every `DynamicMessage` it hands out,
/// so a nested message field can resolve its own descriptor without
/// re-walking the file set.
#[derive(Debug, Default, PartialEq)]
pub struct Pool {
    messages: HashMap<String, Arc<DescriptorProto>>,
}

impl Pool {
    pub fn new() -> Self {
        Pool::default()
    }

    pub fn from_file_set(set: &FileDescriptorSet) -> Self {
        let mut messages = HashMap::new();
        for file in &set.file {
            let package = file.package.as_deref().unwrap_or("");
            for message in &file.message_type {
                insert(&mut messages, package, message);
            }
        }
        Pool { messages }
    }

    /// Looks up a message type by fully-qualified name, with or without the
    /// leading dot `FieldDescriptorProto.type_name` carries.
    pub fn message(&self, name: &str) -> Option<&Arc<DescriptorProto>> {
        self.messages.get(name.trim_start_matches('.'))
    }

    /// Builds an empty dynamic message for a named type, for callers
    /// constructing a top-level message to decode into.
    pub fn new_message(self: &Arc<Self>, name: &str) -> Option<DynamicMessage> {
        self.message(name).map(|descriptor| DynamicMessage::new(descriptor.clone(), self.clone()))
    }
}

fn insert(messages: &mut HashMap<String, Arc<DescriptorProto>>, prefix: &str, message: &DescriptorProto) {
    let name = message.name.clone().unwrap_or_default();
    let full_name = if prefix.is_empty() { name } else { format!("{prefix}.{name}") };
    for nested in &message.nested_type {
        insert(messages, &full_name, nested);
    }
    messages.insert(full_name, Arc::new(message.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> FileDescriptorSet {
        use protokit_types::descriptor::FileDescriptorProto;

        FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("a.proto".into()),
                package: Some("pkg".into()),
                message_type: vec![DescriptorProto {
                    name: Some("Outer".into()),
                    nested_type: vec![DescriptorProto {
                        name: Some("Inner".into()),
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
    fn resolves_top_level_and_nested_names() {
        let pool = Pool::from_file_set(&set());
        assert!(pool.message("pkg.Outer").is_some());
        assert!(pool.message(".pkg.Outer").is_some());
        assert!(pool.message("pkg.Outer.Inner").is_some());
        assert!(pool.message("pkg.Missing").is_none());
    }
}
