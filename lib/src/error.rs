use std::{fmt, io};
use std::panic::Location;
use std::error::Error as StdError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The classification of an [`Error`].
///
/// Context added with [`Chainable::chain()`] never hides a classification:
/// [`Error::kind()`] reports the first kind other than [`Kind::Other`] found
/// along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A source file is missing or unreadable.
    DataSource,
    /// A source file's contents are malformed for their declared format.
    DataParse,
    /// The template engine failed to compile or render a template.
    TemplateRender,
    /// There is no rules document to render.
    MissingRules,
    /// Settings or flags are invalid.
    Config,
    /// Anything else.
    Other,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::DataSource => "data source error",
            Kind::DataParse => "data parse error",
            Kind::TemplateRender => "template render error",
            Kind::MissingRules => "missing rules document",
            Kind::Config => "configuration error",
            Kind::Other => "error",
        };

        name.fmt(f)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    detail: Vec<Box<dyn ErrorDetail>>,
    prev: Option<Box<Error>>,
    _location: &'static Location<'static>,
}

pub trait ErrorDetail: fmt::Display + fmt::Debug + Send + Sync {
    fn context(&self) -> Vec<(Option<String>, String)> { vec![] }
}

impl Error {
    #[track_caller]
    pub fn from_std<E>(error: E) -> Self
        where E: StdError + Send + Sync + 'static
    {
        Error::from(Box::new(error) as Box<dyn StdError + Send + Sync>)
    }

    pub fn from_detail(detail: &dyn ErrorDetail) -> Self {
        Error::from(MakeshiftError::from(detail))
    }

    pub fn kind(&self) -> Kind {
        match (self.kind, &self.prev) {
            (Kind::Other, Some(prev)) => prev.kind(),
            (kind, _) => kind,
        }
    }

    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    /// Places `self` behind `other`, which becomes the outermost error.
    pub fn chain(self, mut other: Error) -> Self {
        #[inline]
        fn _chain(error: Error, behind: &mut Error) {
            match behind.prev.as_mut() {
                Some(prev) => _chain(error, prev),
                None => behind.prev = Some(Box::new(error)),
            }
        }

        _chain(self, &mut other);
        other
    }
}

impl ErrorDetail for &(dyn StdError + Send + Sync) {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let mut ctxt = vec![];
        let mut error = self.source();
        while let Some(e) = error {
            ctxt.push((None, e.to_string()));
            error = e.source();
        }

        ctxt
    }
}

impl ErrorDetail for Box<dyn StdError + Send + Sync> {
    fn context(&self) -> Vec<(Option<String>, String)> {
        let error: &(dyn StdError + Send + Sync) = &**self;
        error.context()
    }
}

macro_rules! impl_error_detail_with_std_error {
    ($T:ty) => {
        impl $crate::error::ErrorDetail for $T {
            fn context(&self) -> Vec<(Option<String>, String)> {
                let error: &(dyn std::error::Error + Send + Sync) = self;
                error.context()
            }
        }
    }
}

impl_error_detail_with_std_error!(io::Error);
impl_error_detail_with_std_error!(csv::Error);
impl_error_detail_with_std_error!(toml::de::Error);
impl_error_detail_with_std_error!(serde_json::Error);
impl_error_detail_with_std_error!(std::string::FromUtf8Error);

impl ErrorDetail for String { }
impl ErrorDetail for &str { }

impl Clone for Error {
    fn clone(&self) -> Self {
        Error {
            kind: self.kind,
            detail: self.detail.iter()
                .map(|detail| MakeshiftError::from(&**detail))
                .map(|error| Box::new(error) as Box<dyn ErrorDetail>)
                .collect(),
            prev: self.prev.clone(),
            _location: self._location,
        }
    }
}

impl<T: ErrorDetail + 'static> From<T> for Error {
    #[track_caller]
    fn from(detail: T) -> Self {
        Error {
            kind: Kind::Other,
            prev: None,
            detail: vec![Box::new(detail)],
            _location: Location::caller(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[derive(Copy, Clone)] struct Indent(usize);

        impl fmt::Display for Indent {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for _ in 0..(self.0 * 4) { write!(f, " ")? }
                Ok(())
            }
        }

        struct NestedError<'a>(Indent, &'a Error);

        impl fmt::Display for NestedError<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let NestedError(indent, e) = self;
                let indent_line = format!("\n{indent}");

                for detail in &e.detail {
                    let message = format!("{:#}", detail).replace('\n', &indent_line);
                    writeln!(f, "{indent}{message}")?;
                    for (key, value) in detail.context() {
                        let value = value.replace('\n', &indent_line);
                        match key {
                            Some(key) => writeln!(f, "{indent}{key}: {value}")?,
                            None => writeln!(f, "{indent}{value}")?,
                        }
                    }

                    if std::env::var_os("RUST_BACKTRACE").is_some() {
                        writeln!(f, "{indent}[{}]", e._location)?;
                    }
                }

                if let Some(prev) = &e.prev {
                    NestedError(Indent(indent.0 + 1), prev).fmt(f)?;
                }

                Ok(())
            }
        }

        if self.kind() != Kind::Other {
            writeln!(f, "[{}]", self.kind())?;
        }

        NestedError(Indent(0), self).fmt(f)
    }
}

#[derive(Debug)]
pub struct MakeshiftError {
    pub message: String,
    pub parameters: Vec<(Option<String>, String)>,
}

impl From<&dyn ErrorDetail> for MakeshiftError {
    #[inline]
    fn from(detail: &dyn ErrorDetail) -> Self {
        MakeshiftError {
            message: detail.to_string(),
            parameters: detail.context()
        }
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! err {
    ($($token:tt)*) => (Err($crate::error!($($token)*)));
}

/// Builds an [`Error`](crate::error::Error) from a message and context.
///
/// Context entries are either `key => value` pairs or bare values:
///
/// ```rust
/// use cardpress::error;
/// use cardpress::error::Kind;
///
/// let e = error!("failed to read card data", "path" => "deck.csv", "row 3");
/// assert_eq!(e.kind(), Kind::Other);
/// assert!(e.to_string().contains("path: deck.csv"));
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($msg:expr, $($rest:tt)*) => (
        $crate::error::Error::from($crate::error::MakeshiftError {
            message: $msg.to_string(),
            parameters: {
                #[allow(unused_mut)]
                let mut v: Vec<(Option<String>, String)> = Vec::new();
                $crate::error!(@param v $($rest)*);
                v
            },
        })
    );

    ($msg:expr) => ( $crate::error!($msg,) );

    (@param $v:ident $key:expr => $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $key => $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $key:expr => $value:expr) => {
        $v.push((Some($key.to_string()), $value.to_string()));
    };

    (@param $v:ident $value:expr, $($rest:tt)*) => {
        $crate::error!(@param $v $value);
        $crate::error!(@param $v $($rest)*);
    };

    (@param $v:ident $value:expr) => {
        $v.push((None, $value.to_string()));
    };

    (@param $v:ident $(,)?) => { };
}

impl fmt::Display for MakeshiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl ErrorDetail for MakeshiftError {
    fn context(&self) -> Vec<(Option<String>, String)> {
        self.parameters.clone()
    }
}

pub trait Chainable<T> {
    fn chain(self, other: impl Into<Error>) -> Result<T>;

    fn chain_with<F, E>(self, f: F) -> Result<T>
        where F: FnOnce() -> E, E: Into<Error>;

    fn with_kind(self, kind: Kind) -> Result<T>;
}

impl<T, E: Into<Error>> Chainable<T> for Result<T, E> {
    #[track_caller]
    fn chain(self, other: impl Into<Error>) -> Result<T> {
        self.map_err(|e| e.into().chain(other.into()))
    }

    #[track_caller]
    fn chain_with<F, Err>(self, f: F) -> Result<T>
        where F: FnOnce() -> Err, Err: Into<Error>,
    {
        self.map_err(|e| e.into().chain(f().into()))
    }

    #[track_caller]
    fn with_kind(self, kind: Kind) -> Result<T> {
        self.map_err(|e| e.into().with_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_chaining() {
        let inner: Result<()> = Err(error!("no such file")).with_kind(Kind::DataSource);
        let outer = inner.chain(error!("failed to load card data", "path" => "_card.csv"));
        let e = outer.unwrap_err();
        assert_eq!(e.kind(), Kind::DataSource);
        assert!(e.is(Kind::DataSource));
    }

    #[test]
    fn outer_kind_wins() {
        let e = error!("bad").with_kind(Kind::DataParse)
            .chain(error!("outer").with_kind(Kind::TemplateRender));

        assert_eq!(e.kind(), Kind::TemplateRender);
    }

    #[test]
    fn display_lists_context_and_chain() {
        let e = error!("inner", "row" => 3).chain(error!("outer", "path" => "deck.csv"));
        let string = e.to_string();
        let outer = string.find("outer").unwrap();
        let inner = string.find("inner").unwrap();
        assert!(outer < inner);
        assert!(string.contains("path: deck.csv"));
        assert!(string.contains("    row: 3"));
    }

    #[test]
    fn clone_keeps_kind() {
        let e = error!("gone").with_kind(Kind::MissingRules);
        assert_eq!(e.clone().kind(), Kind::MissingRules);
    }
}
