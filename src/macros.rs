//! Accessor macros for node payload enums
//!
//! These macros eliminate repetitive match code on [`NodeData`](crate::NodeData).
//! They use `paste` internally for identifier concatenation.

/// Generate is_xxx, as_xxx, as_xxx_mut for enums with single-field variants
///
/// Uses paste's `:camel` modifier to convert method name to variant name.
///
/// # Generated methods per variant:
/// - `is_xxx(&self) -> bool`
/// - `as_xxx(&self) -> Option<&Type>`
/// - `as_xxx_mut(&mut self) -> Option<&mut Type>`
///
/// # Example
/// ```ignore
/// impl NodeData {
///     // element -> Element(Element), leaf -> Leaf(String)
///     impl_enum_accessors!(element: Element, leaf: String);
/// }
/// ```
#[macro_export]
macro_rules! impl_enum_accessors {
    ($($variant:ident : $ty:ty),* $(,)?) => {
        ::paste::paste! {
            $(
                #[doc = "Check if this is a " [<$variant:camel>] " node"]
                #[inline]
                pub fn [<is_ $variant>](&self) -> bool {
                    matches!(self, Self::[<$variant:camel>](_))
                }

                #[doc = "Try to get the " $variant " payload"]
                #[inline]
                pub fn [<as_ $variant>](&self) -> Option<&$ty> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }

                #[doc = "Try to get the " $variant " payload mutably"]
                #[inline]
                pub fn [<as_ $variant _mut>](&mut self) -> Option<&mut $ty> {
                    match self { Self::[<$variant:camel>](v) => Some(v), _ => None }
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug)]
    enum Shape {
        Circle(f64),
        Label(String),
    }

    impl Shape {
        impl_enum_accessors!(circle: f64, label: String);
    }

    #[test]
    fn test_generated_accessors() {
        let mut shape = Shape::Label("a".to_string());
        assert!(shape.is_label());
        assert!(!shape.is_circle());
        assert_eq!(shape.as_circle(), None);

        if let Some(label) = shape.as_label_mut() {
            label.push('b');
        }
        assert_eq!(shape.as_label().map(String::as_str), Some("ab"));

        let circle = Shape::Circle(2.0);
        assert_eq!(circle.as_circle(), Some(&2.0));
    }
}
