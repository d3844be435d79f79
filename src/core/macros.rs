//! Macros for ergonomic member calls.

/// Build [`Args`](crate::Args) from `name => value` pairs.
///
/// # Example
///
/// ```
/// use statehold::args;
///
/// let args = args! { "address" => "Main Street 1", "price_sold" => 4.99 };
/// assert_eq!(args.get::<f64>("price_sold").unwrap(), 4.99);
///
/// let empty = args! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $(args.insert($name, $value);)+
        args
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn args_macro_collects_pairs() {
        let args = args! {
            "cost" => 3.59,
            "stock_location" => 331,
        };

        assert_eq!(args.len(), 2);
        assert_eq!(args.get::<f64>("cost").unwrap(), 3.59);
        assert_eq!(args.get::<i64>("stock_location").unwrap(), 331);
    }

    #[test]
    fn empty_args_macro() {
        let args = args! {};
        assert!(args.is_empty());
    }
}
