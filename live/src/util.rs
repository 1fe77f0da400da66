use memchr::memmem;

/// Inserts `script` before the last `</body>` in `html`, or appends it when
/// there is none.
pub fn inject_script(html: &[u8], script: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(html.len() + script.len());
    match memmem::rfind(html, b"</body>") {
        Some(i) => {
            output.extend_from_slice(&html[..i]);
            output.extend_from_slice(script);
            output.extend_from_slice(&html[i..]);
        }
        None => {
            output.extend_from_slice(html);
            output.extend_from_slice(script);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn before_last_body_close() {
        let html = b"<body><pre></body></pre></body></html>";
        let out = inject_script(html, b"<script></script>");
        assert_eq!(out, b"<body><pre></body></pre><script></script></body></html>");
    }

    #[test]
    fn appended_without_body() {
        let out = inject_script(b"<div>card</div>", b"<script></script>");
        assert_eq!(out, b"<div>card</div><script></script>");
    }
}
