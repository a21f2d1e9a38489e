use std::io::{self, Write};

use inference_harness::{RunOutput, UsageRecord};

/// One `metric = value` line per usage metric, preceded by a newline that
/// ends the streamed text.
pub fn write_usage(out: &mut impl Write, usage: Option<&UsageRecord>) -> io::Result<()> {
    let Some(usage) = usage else {
        return Ok(());
    };
    writeln!(out)?;
    for (metric, value) in usage.metrics() {
        match value.as_str() {
            Some(text) => writeln!(out, "{metric} = {text}")?,
            None => writeln!(out, "{metric} = {value}")?,
        }
    }
    Ok(())
}

pub fn write_html(out: &mut impl Write, html: Option<&str>) -> io::Result<()> {
    if let Some(html) = html {
        writeln!(out, "\nExtracted HTML code:\n{html}")?;
    }
    Ok(())
}

/// Everything printed after the stream ends.
pub fn write_summary(out: &mut impl Write, output: &RunOutput) -> io::Result<()> {
    write_usage(out, output.usage.as_ref())?;
    write_html(out, output.html().as_deref())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(output: &RunOutput) -> String {
        let mut buf = Vec::new();
        write_summary(&mut buf, output).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn usage_lines_then_extracted_html() {
        let usage: UsageRecord =
            serde_json::from_str(r#"{"completion_tokens":7,"prompt_tokens":30,"total_tokens":37}"#)
                .expect("usage");
        let output = RunOutput {
            text: "Sure!\n```html\n<body>\n</body>\n```\n".into(),
            usage: Some(usage),
            finish_reason: Some("stop".into()),
        };
        assert_eq!(
            render(&output),
            "\ncompletion_tokens = 7\nprompt_tokens = 30\ntotal_tokens = 37\n\nExtracted HTML code:\n<body>\n</body>\n"
        );
    }

    #[test]
    fn string_metrics_print_without_quotes() {
        let usage: UsageRecord =
            serde_json::from_str(r#"{"tier":"free","details":{"cached":0}}"#).expect("usage");
        let mut buf = Vec::new();
        write_usage(&mut buf, Some(&usage)).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "\ntier = free\ndetails = {\"cached\":0}\n"
        );
    }

    #[test]
    fn nothing_is_written_without_usage_or_html() {
        let output = RunOutput {
            text: "no code here".into(),
            ..RunOutput::default()
        };
        assert_eq!(render(&output), "");
    }
}
