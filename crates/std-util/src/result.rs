/// Unwraps an `Err`, panicking with the `Ok` value otherwise. Extra arguments
/// are formatted and appended to the panic message.
#[macro_export]
macro_rules! assert_err {
    ($e:expr $(, $($t:tt)* )?) => {
        match $e {
            Err(err) => err,
            Ok(value) => {
                let context: Option<String> = None $( .or(Some(format!($($t)*))) )?;
                match context {
                    Some(context) => panic!("expected `Err`; actual=Ok({value:?}), {context}"),
                    None => panic!("expected `Err`; actual=Ok({value:?})"),
                }
            }
        }
    };
}

/// Unwraps an `Ok`, panicking with the error's display output otherwise.
#[macro_export]
macro_rules! assert_ok {
    ($e:expr $(, $($t:tt)* )?) => {
        match $e {
            Ok(value) => value,
            Err(err) => {
                let context: Option<String> = None $( .or(Some(format!($($t)*))) )?;
                match context {
                    Some(context) => panic!("expected `Ok`; actual error: {err}, {context}"),
                    None => panic!("expected `Ok`; actual error: {err}"),
                }
            }
        }
    };
}
