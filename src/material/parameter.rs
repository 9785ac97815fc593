//! Named material parameters and their exclusive payloads.

use crate::effect::uniform::UniformVariable;
use crate::utils::prelude::HashValue;

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Empty,
    Value(UniformVariable),
    Auto(String),
}

/// A named slot on a material, technique or pass. The payload is exactly
/// one of an explicit value or an auto-binding name; recording one kind
/// clears the other.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialParameter {
    name: String,
    hash: HashValue<str>,
    payload: Payload,
}

impl MaterialParameter {
    pub fn new<T: Into<String>>(name: T) -> Self {
        let name = name.into();
        let hash = HashValue::from(&name);
        MaterialParameter {
            name,
            hash,
            payload: Payload::Empty,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn hash(&self) -> HashValue<str> {
        self.hash
    }

    /// Records an explicit value, discarding any auto-binding.
    pub fn set_value<T: Into<UniformVariable>>(&mut self, value: T) {
        self.payload = Payload::Value(value.into());
    }

    /// Records an auto-binding name, discarding any explicit value. The
    /// name is resolved against the context's resolvers and the built-in
    /// table every time the parameter is bound.
    pub fn bind_auto<T: Into<String>>(&mut self, binding: T) {
        self.payload = Payload::Auto(binding.into());
    }

    /// Clears the payload entirely; an empty parameter is skipped at bind
    /// time.
    pub fn clear(&mut self) {
        self.payload = Payload::Empty;
    }

    pub fn value(&self) -> Option<&UniformVariable> {
        match self.payload {
            Payload::Value(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn auto_binding(&self) -> Option<&str> {
        match self.payload {
            Payload::Auto(ref v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payload == Payload::Empty
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn payload_is_exclusive() {
        let mut param = MaterialParameter::new("u_worldViewProjectionMatrix");
        assert!(param.is_empty());

        param.set_value(1.0f32);
        assert!(param.value().is_some());
        assert_eq!(param.auto_binding(), None);

        param.bind_auto("WORLD_VIEW_PROJECTION_MATRIX");
        assert_eq!(param.value(), None);
        assert_eq!(param.auto_binding(), Some("WORLD_VIEW_PROJECTION_MATRIX"));

        param.set_value(UniformVariable::I32(4));
        assert_eq!(param.auto_binding(), None);
        assert_eq!(param.value(), Some(&UniformVariable::I32(4)));
    }
}
