use std::fmt;

/// One step of a [`Pointer`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    Key(String),
    Index(usize),
}

impl PathComponent {
    pub fn key(name: impl Into<String>) -> Self {
        PathComponent::Key(name.into())
    }

    pub fn index(index: usize) -> Self {
        PathComponent::Index(index)
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // "~" and "/" are escaped so the rendered path stays unambiguous
            PathComponent::Key(key) => {
                for ch in key.chars() {
                    match ch {
                        '~' => write!(f, "~0")?,
                        '/' => write!(f, "~1")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                Ok(())
            }
            PathComponent::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A JSON-pointer-like path into a value tree, rendered as `#/a/b/0`.
///
/// Decode errors carry one of these; components accumulate front-to-back as
/// the error travels up from the failure site to the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    components: Vec<PathComponent>,
}

impl Pointer {
    /// The document root, rendered as `#`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<PathComponent>) -> Self {
        Pointer { components }
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    /// Returns a new pointer with `component` appended.
    pub fn push(&self, component: PathComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Pointer { components }
    }

    /// Prepends `component`, shifting the existing path one level deeper.
    pub fn prepend(&mut self, component: PathComponent) {
        self.components.insert(0, component);
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_renders_as_hash() {
        assert_eq!(Pointer::root().to_string(), "#");
    }

    #[test]
    fn test_push_and_prepend() {
        let path = Pointer::root()
            .push(PathComponent::key("nested1"))
            .push(PathComponent::index(0));
        assert_eq!(path.to_string(), "#/nested1/0");

        let mut path = Pointer::root().push(PathComponent::key("single"));
        path.prepend(PathComponent::key("nested1"));
        assert_eq!(path.to_string(), "#/nested1/single");
    }

    #[test]
    fn test_key_escaping() {
        let path = Pointer::root().push(PathComponent::key("a/b~c"));
        assert_eq!(path.to_string(), "#/a~1b~0c");
    }
}
