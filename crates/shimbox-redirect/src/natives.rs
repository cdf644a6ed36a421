//! Native implementations of the well-known builtin members.

use shimbox_model::{well_known, MemberDescriptor, Value};

use crate::error::EngineError;

pub(crate) fn invoke(desc: &MemberDescriptor, args: &[Value]) -> anyhow::Result<Option<Value>> {
    match (desc.declaring_type.as_str(), desc.name.as_str()) {
        (well_known::TEXT_TYPE, well_known::CONCAT) => match (args.first(), args.get(1)) {
            (Some(Value::Str(a)), Some(Value::Str(b))) => {
                Ok(Some(Value::Str(format!("{a}{b}"))))
            }
            _ => Err(EngineError::TypeFault {
                member: desc.to_string(),
                detail: "concat expects two string arguments".to_string(),
            }
            .into()),
        },
        _ => Err(EngineError::UnknownNative {
            member: desc.to_string(),
        }
        .into()),
    }
}
