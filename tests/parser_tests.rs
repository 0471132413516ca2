// tests/parser_tests.rs - Event reconstruction through the public API
use patlog::scanner::scan_balanced;
use patlog::{
    AppendMode, Event, FormatModifier, Level, OutputFormat, Parser, PatternLayout, PipelineConfig,
    StreamItem, StreamPipeline, JBOSS_DEFAULT_PATTERN,
};
use std::io::Cursor;

const SERVER_LOG: &str = "\
10:15:30,001 INFO  [org.jboss.modules] (main) JBoss Modules version 1.3.7
10:15:30,120 INFO  [org.jboss.as] (MSC service thread 1-6) WFLYSRV0049: WildFly starting
10:15:31,400 ERROR [org.jboss.as.controller.management-operation] (Controller Boot Thread) WFLYCTL0013: Operation failed: java.lang.IllegalStateException: WFLYCTL0170: missing resource
\tat org.jboss.as.controller.OperationContextImpl.executeStep(OperationContextImpl.java:1100)
\tat java.lang.Thread.run(Thread.java:748)
Caused by: java.io.FileNotFoundException: standalone.xml
\t... 2 more
10:15:32,000 WARN  [org.jboss.as.server] (Controller Boot Thread) WFLYSRV0212: Resuming server
";

fn parse_all(parser: &mut Parser, input: &str) -> Vec<Event> {
    let mut events = Vec::new();
    for (i, line) in input.lines().enumerate() {
        events.extend(parser.parse(i + 1, line).unwrap());
    }
    events.extend(parser.close().into_iter().filter_map(|item| match item {
        StreamItem::Event(event) => Some(event),
        StreamItem::EndOfStream => None,
    }));
    events
}

#[test]
fn test_raw_round_trip_with_layout() {
    let mut parser = Parser::with_pattern(JBOSS_DEFAULT_PATTERN).unwrap();
    let events = parse_all(&mut parser, SERVER_LOG);
    assert_eq!(events.len(), 4);

    let rebuilt: String = events.iter().map(|e| format!("{}\n", e.raw)).collect();
    assert_eq!(rebuilt, SERVER_LOG);
    let lines: Vec<usize> = events.iter().map(|e| e.line_number).collect();
    assert_eq!(lines, vec![1, 2, 3, 8]);
}

#[test]
fn test_raw_round_trip_heuristic() {
    let mut parser = Parser::heuristic();
    let events = parse_all(&mut parser, SERVER_LOG);
    let rebuilt: String = events.iter().map(|e| format!("{}\n", e.raw)).collect();
    assert_eq!(rebuilt, SERVER_LOG);
}

#[test]
fn test_stack_trace_goes_to_exception() {
    let mut parser = Parser::with_pattern(JBOSS_DEFAULT_PATTERN).unwrap();
    let events = parse_all(&mut parser, SERVER_LOG);
    let failed = &events[2];

    assert_eq!(failed.level, Some(Level::Error));
    assert_eq!(failed.thread_name.as_deref(), Some("Controller Boot Thread"));
    assert_eq!(failed.message.as_deref(), Some("WFLYCTL0013: Operation failed"));
    assert_eq!(failed.append_mode, AppendMode::Exception);
    let exception = failed.exception_rendering.as_deref().unwrap();
    assert!(exception.starts_with("java.lang.IllegalStateException: WFLYCTL0170: missing resource\n\tat "));
    assert!(exception.ends_with("Caused by: java.io.FileNotFoundException: standalone.xml\n\t... 2 more"));
    assert_eq!(failed.line_count(), 5);
}

#[test]
fn test_heuristic_appends_stack_trace_to_message() {
    let mut parser = Parser::heuristic();
    let events = parse_all(&mut parser, SERVER_LOG);
    let failed = &events[2];
    assert_eq!(failed.timestamp, Some(37_531_400));
    assert_eq!(failed.logger.as_deref(), Some("org.jboss.as.controller.management-operation"));
    assert!(failed.exception_rendering.is_none());
    let message = failed.message.as_deref().unwrap();
    assert_eq!(message.lines().count(), 5);
}

#[test]
fn test_balanced_scan() {
    let enclosed = scan_balanced("a [b [c] d] e", 0, '[', ']').unwrap().unwrap();
    assert_eq!(enclosed.content, "b [c] d");
    assert_eq!(enclosed.next, 11);

    let err = scan_balanced("a [b", 0, '[', ']').unwrap_err();
    assert_eq!(err.open, 2);
}

#[test]
fn test_modifier_examples() {
    let apply = |m: &str, v: &str| FormatModifier::parse(m).unwrap().apply(v).into_owned();
    assert_eq!(apply("5", ""), "     ");
    assert_eq!(apply("-5", "a"), "a    ");
    assert_eq!(apply(".3", "ABCD"), "BCD");
    assert_eq!(apply("-2.-3", "ABCD"), "ABC");
}

#[test]
fn test_heuristic_examples() {
    let mut parser = Parser::heuristic();
    let events = parse_all(
        &mut parser,
        "ERROR [org.jboss.modules] (main) JBoss Modules version 1.3.7\n\
         ERROR [io.test] (something (nested (deep) more)) rest\n",
    );
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].logger.as_deref(), Some("org.jboss.modules"));
    assert_eq!(events[0].thread_name.as_deref(), Some("main"));
    assert_eq!(events[0].message.as_deref(), Some("JBoss Modules version 1.3.7"));
    assert_eq!(events[1].thread_name.as_deref(), Some("something (nested (deep) more)"));
    assert_eq!(events[1].message.as_deref(), Some("rest"));
}

#[test]
fn test_close_markers() {
    let mut parser = Parser::heuristic();
    assert_eq!(parser.close(), vec![StreamItem::EndOfStream]);

    let mut parser = Parser::heuristic();
    assert!(parser.parse(1, "INFO [a] (b) only").unwrap().is_empty());
    let items = parser.close();
    assert_eq!(items.len(), 2);
    assert!(items[0].as_event().is_some());
    assert!(items[1].is_end());
}

#[test]
fn test_custom_layout_with_padding_and_unknown_conversions() {
    let layout = "%d{yyyy-MM-dd HH:mm:ss,SSS} %5p %X{requestId} %-20.20c{1} - %m%n";
    let input = "\
2024-01-15 10:00:00,250  WARN req-17 Cache                - evicted 3 entries
    while compacting
2024-01-15 10:00:01,000 ERROR req-18 Store                - write failed
";
    let mut parser = Parser::with_pattern(layout).unwrap();
    let events = parse_all(&mut parser, input);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].timestamp, Some(1_705_312_800_250));
    assert_eq!(events[0].level, Some(Level::Warn));
    assert_eq!(events[0].logger.as_deref(), Some("Cache"));
    assert_eq!(events[0].message.as_deref(), Some("evicted 3 entries\n    while compacting"));
    assert_eq!(events[1].level, Some(Level::Error));
}

#[test]
fn test_layout_output_re_renders_events() {
    let input = "10:15:30,001 INFO  [org.jboss.as] (main) started\n";
    let mut pipeline = StreamPipeline::new(PipelineConfig {
        pattern: Some(JBOSS_DEFAULT_PATTERN.to_string()),
        output_format: OutputFormat::Layout,
        output_pattern: Some("%p %c: %m".to_string()),
        ..Default::default()
    })
    .unwrap();
    let mut output = Vec::new();
    pipeline
        .process_stream(Cursor::new(input), &mut output, None)
        .unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "INFO org.jboss.as: started\n");
}

#[test]
fn test_compile_reproduces_literal() {
    let layout = PatternLayout::compile(JBOSS_DEFAULT_PATTERN).unwrap();
    let joined: String = layout.components().iter().map(|c| c.literal()).collect();
    assert_eq!(joined, JBOSS_DEFAULT_PATTERN);
    assert_eq!(layout.to_string(), JBOSS_DEFAULT_PATTERN);
}

#[test]
fn test_field_ends_at_first_separator() {
    let mut parser = Parser::with_pattern("%d{ABSOLUTE} %p %c - %m%n").unwrap();
    let events = parse_all(&mut parser, "10:00:00,000 INFO a.b - value - with dash\n");
    assert_eq!(events[0].logger.as_deref(), Some("a.b"));
    assert_eq!(events[0].message.as_deref(), Some("value - with dash"));

    let mut parser = Parser::with_pattern(JBOSS_DEFAULT_PATTERN).unwrap();
    let events = parse_all(&mut parser, "10:00:00,000 INFO  [a] (pool) worker) hello\n");
    assert_eq!(events[0].thread_name.as_deref(), Some("pool"));
    assert_eq!(events[0].message.as_deref(), Some("worker) hello"));
}

#[test]
fn test_first_throwable_starts_the_exception() {
    let input = "\
10:15:30,001 ERROR [a] (main) Failed: com.acme.Wrapper: outer: java.io.IOException: disk
10:15:30,002 ERROR [a] (main) Failed: reason: java.io.IOException: disk
";
    let mut parser = Parser::with_pattern(JBOSS_DEFAULT_PATTERN).unwrap();
    let events = parse_all(&mut parser, input);
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].message.as_deref(), Some("Failed"));
    assert_eq!(
        events[0].exception_rendering.as_deref(),
        Some("com.acme.Wrapper: outer: java.io.IOException: disk")
    );
    assert_eq!(events[1].message.as_deref(), Some("Failed: reason"));
    assert_eq!(
        events[1].exception_rendering.as_deref(),
        Some("java.io.IOException: disk")
    );
}

#[test]
fn test_heuristic_level_word_in_message_body() {
    let input = "\
10:15:30,001 INFO  [org.acme] (main) Report follows:
ERROR count is 3 for this run
WARN [partial
10:15:31,000 INFO  [org.acme] (main) done
";
    let mut pipeline = StreamPipeline::new(PipelineConfig::default()).unwrap();
    let mut output = Vec::new();
    let stats = pipeline
        .process_stream(Cursor::new(input), &mut output, None)
        .unwrap();
    assert_eq!(stats.fatal_errors, 0);
    assert_eq!(stats.events_written, 2);
    assert_eq!(String::from_utf8(output).unwrap(), input);
}

#[test]
fn test_unix_preset_digit_run_is_continuation() {
    let mut parser = Parser::with_pattern("%d{UNIX_MILLIS} %p %m").unwrap();
    let events = parse_all(
        &mut parser,
        "1700000000123 WARN dump follows\n123456789012345678901234567890 0xff\n",
    );
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp, Some(1_700_000_000_123));
    assert_eq!(events[0].line_count(), 2);
}
