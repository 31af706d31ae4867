use std::collections::BTreeMap;

use super::input_type::InputType;

/// Maps input names (e.g. `"customerid"`) to the primitive type inferred for them.
///
/// Filled while conditions are compiled. A name keeps the first type it was declared
/// with; declaring it again with a different type is rejected so that every condition
/// reading the input agrees on how it is cast. Iteration is ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<String, InputType>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` as `ty`.
    ///
    /// Returns `Ok(true)` when the name was newly registered and `Ok(false)` when it was
    /// already registered with the same type.
    ///
    /// # Errors
    ///
    /// Returns the previously registered type when it differs from `ty`.
    pub fn declare(&mut self, name: &str, ty: InputType) -> Result<bool, InputType> {
        match self.types.get(name) {
            Some(&previous) if previous == ty => Ok(false),
            Some(&previous) => Err(previous),
            None => {
                self.types.insert(name.to_owned(), ty);
                Ok(true)
            }
        }
    }

    /// Look up the type registered for an input name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<InputType> {
        self.types.get(name).copied()
    }

    /// The number of registered inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate over all registered (name, type) pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, InputType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, InputType)> for TypeRegistry {
    fn from_iter<T: IntoIterator<Item = (String, InputType)>>(iter: T) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}
