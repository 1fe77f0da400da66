/// Builds a [`Dict`](crate::value::Dict) from `key => value` pairs, in order.
///
/// ```rust
/// use cardpress::dict;
///
/// let dict = dict! { "name" => "Fireball", "num_cards" => 2 };
/// let keys: Vec<_> = dict.keys().map(|k| &**k).collect();
/// assert_eq!(keys, ["name", "num_cards"]);
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut dict: $crate::value::Dict = $crate::value::Dict::new();
        $(dict.insert($key.into(), $crate::value::Value::from($value));)*
        dict
    });
}

pub use dict;
