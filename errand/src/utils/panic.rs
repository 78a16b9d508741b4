use std::any::Any;

/// Extracts the message of a caught panic.
///
/// `panic!` payloads are a `&'static str` or a `String`; anything else is
/// reported generically.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("Box<dyn Any>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::panic;

    #[test]
    fn extracts_static_and_formatted_messages() {
        let payload = panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "code 7");

        let payload = panic::catch_unwind(|| panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "Box<dyn Any>");
    }
}
