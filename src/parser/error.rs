//! Diagnostic macro family.
//!
//! All diagnostics funnel through the context so that severity counters,
//! the `well_formed`/`valid` flags and the locator stay consistent. The
//! fatal variants evaluate to the built `XmlError`; call sites wrap them
//! in `Err(...)` and unwind with `?`.

/// Handle a fatal parser error, i.e. violating Well-Formedness constraints
macro_rules! xml_fatal_err_msg {
    ($ctxt:expr, $error:expr, $msg:literal) => {
        $ctxt.raise_fatal($error, &[], format!($msg))
    };
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr) => {{
        let str1 = $str1.to_string();
        let msg = format!($msg, str1);
        $ctxt.raise_fatal($error, &[str1.as_str()], msg)
    }};
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr, $str2:expr) => {{
        let str1 = $str1.to_string();
        let str2 = $str2.to_string();
        let msg = format!($msg, str1, str2);
        $ctxt.raise_fatal($error, &[str1.as_str(), str2.as_str()], msg)
    }};
}
pub(crate) use xml_fatal_err_msg;

/// Handle a non fatal parser error
macro_rules! xml_err_msg_str {
    ($ctxt:expr, $error:expr, $msg:literal) => {
        $ctxt.raise_error($error, &[], format!($msg))
    };
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr) => {{
        let str1 = $str1.to_string();
        let msg = format!($msg, str1);
        $ctxt.raise_error($error, &[str1.as_str()], msg)
    }};
}
pub(crate) use xml_err_msg_str;

/// Handle a validity error.
macro_rules! xml_validity_error {
    ($ctxt:expr, $error:expr, $msg:literal) => {
        $ctxt.raise_validity_error($error, &[], format!($msg))
    };
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr) => {{
        let str1 = $str1.to_string();
        let msg = format!($msg, str1);
        $ctxt.raise_validity_error($error, &[str1.as_str()], msg)
    }};
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr, $str2:expr) => {{
        let str1 = $str1.to_string();
        let str2 = $str2.to_string();
        let msg = format!($msg, str1, str2);
        $ctxt.raise_validity_error($error, &[str1.as_str(), str2.as_str()], msg)
    }};
}
pub(crate) use xml_validity_error;

/// Handle a warning.
macro_rules! xml_warning_msg {
    ($ctxt:expr, $error:expr, $msg:literal) => {
        $ctxt.raise_warning($error, &[], format!($msg))
    };
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr) => {{
        let str1 = $str1.to_string();
        let msg = format!($msg, str1);
        $ctxt.raise_warning($error, &[str1.as_str()], msg)
    }};
    ($ctxt:expr, $error:expr, $msg:literal, $str1:expr, $str2:expr) => {{
        let str1 = $str1.to_string();
        let str2 = $str2.to_string();
        let msg = format!($msg, str1, str2);
        $ctxt.raise_warning($error, &[str1.as_str(), str2.as_str()], msg)
    }};
}
pub(crate) use xml_warning_msg;
