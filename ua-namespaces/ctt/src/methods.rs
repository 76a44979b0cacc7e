use opcua::types::{Argument, DataTypeId, LocalizedText, UAString, Variant};
use ua_sdk::{MethodInvocationHandler, UaError, UaResult, VALUE_RANK_SCALAR};

pub const SQRT_METHOD_NAME: &str = "sqrt(x)";

pub const SQRT_DESCRIPTION: &str =
    "Returns the correctly rounded positive square root of a double value.";

fn double_argument(name: &str, description: &str) -> Argument {
    Argument {
        name: UAString::from(name),
        data_type: DataTypeId::Double.into(),
        value_rank: VALUE_RANK_SCALAR,
        array_dimensions: None,
        description: LocalizedText::new("en", description),
    }
}

pub fn sqrt_input_arguments() -> Vec<Argument> {
    vec![double_argument("x", "A value.")]
}

pub fn sqrt_output_arguments() -> Vec<Argument> {
    vec![double_argument(
        "x_sqrt",
        "The positive square root of x. If the argument is NaN or less than zero, the result is NaN.",
    )]
}

/// `sqrt(x)`: one Double in, its positive square root out.
///
/// NaN and negative inputs yield NaN rather than an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqrtInvocationHandler;

impl MethodInvocationHandler for SqrtInvocationHandler {
    fn invoke(&self, inputs: &[Variant]) -> UaResult<Vec<Variant>> {
        match inputs {
            [Variant::Double(x)] => Ok(vec![Variant::Double(x.sqrt())]),
            [other] => Err(UaError::InvalidArgument {
                reason: format!("x must be a Double, got {other:?}"),
            }),
            _ => Err(UaError::InvalidArgument {
                reason: format!("expected exactly one argument, got {}", inputs.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqrt(x: f64) -> f64 {
        match SqrtInvocationHandler
            .invoke(&[Variant::Double(x)])
            .unwrap()
            .as_slice()
        {
            [Variant::Double(r)] => *r,
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[test]
    fn positive_root() {
        assert_eq!(sqrt(4.0), 2.0);
        assert_eq!(sqrt(0.0), 0.0);
        assert_eq!(sqrt(2.25), 1.5);
    }

    #[test]
    fn negative_and_nan_yield_nan() {
        assert!(sqrt(-1.0).is_nan());
        assert!(sqrt(f64::NAN).is_nan());
    }

    #[test]
    fn non_double_input_is_invalid() {
        let err = SqrtInvocationHandler
            .invoke(&[Variant::Int32(4)])
            .unwrap_err();
        assert!(matches!(err, UaError::InvalidArgument { .. }));
        assert!(SqrtInvocationHandler.invoke(&[]).is_err());
    }

    #[test]
    fn arguments_describe_doubles() {
        let inputs = sqrt_input_arguments();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, UAString::from("x"));
        assert_eq!(inputs[0].value_rank, VALUE_RANK_SCALAR);
        assert_eq!(sqrt_output_arguments()[0].name, UAString::from("x_sqrt"));
    }
}
