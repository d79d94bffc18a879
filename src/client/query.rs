//! `application/x-www-form-urlencoded` serialisation of snapshot parameters.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes left untouched by the form-urlencoded serialiser besides ASCII
/// alphanumerics. Space is mapped to `+` separately.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

fn encode_component(s: &str, out: &mut String) {
    for (i, chunk) in s.split(' ').enumerate() {
        if i > 0 {
            out.push('+');
        }
        out.extend(utf8_percent_encode(chunk, FORM_ENCODE_SET));
    }
}

/// Join `params` as `key=value` pairs separated by `&`, in order.
pub(crate) fn form_urlencode<K, V>(params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        encode_component(key.as_ref(), &mut out);
        out.push('=');
        encode_component(value.as_ref(), &mut out);
    }
    out
}
