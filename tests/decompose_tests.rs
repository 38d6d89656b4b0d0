use helm_debugger::executor::{build, range_label};
use helm_debugger::parser::{
    decompose, scan_actions, stack_after, BlockType, ControlBlockStack, ControlEvent, ControlKind,
    DecomposeMode, UnitKind,
};

const CONFIGMAP: &str = r#"apiVersion: v1
kind: ConfigMap
metadata:
  name: {{ .Release.Name }}
data:
{{- range $k, $v := .Values.data }}
  {{ $k }}: {{ $v | quote }}
{{- end }}
"#;

fn blocks(source: &str) -> Vec<helm_debugger::parser::TemplateUnit> {
    decompose(source, DecomposeMode::Block).expect("valid template")
}

#[cfg(test)]
mod decompose_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_units_follow_content_lines() {
        let units = blocks(CONFIGMAP);

        assert_eq!(units.len(), 8);
        assert_eq!(units[3].block_type, BlockType::Expression);
        assert_eq!(units[5].block_type, BlockType::Range);
        assert_eq!(units[5].open_depth, 1);
        assert_eq!(units[7].block_type, BlockType::End);
        assert_eq!(units[7].close_depth, 1);
        assert!(units.iter().all(|u| u.kind == UnitKind::Block));
        for (i, u) in units.iter().enumerate() {
            assert_eq!(u.index, i);
            assert_eq!(u.start_line, i + 1);
        }
    }

    #[test]
    fn test_full_prefix_reproduces_source() {
        let units = blocks(CONFIGMAP);
        assert_eq!(build(&units, units.len()), CONFIGMAP);

        let lines = decompose(CONFIGMAP, DecomposeMode::Line).unwrap();
        assert_eq!(build(&lines, lines.len()), CONFIGMAP);
    }

    #[test]
    fn test_valid_file_leaves_empty_stack() {
        let units = blocks(CONFIGMAP);
        assert!(stack_after(&units, units.len()).is_empty());
        assert_eq!(stack_after(&units, 6).depth(), 1);
    }

    #[test]
    fn test_line_mode_one_unit_per_line() {
        let units = decompose("a: 1\n\nb: 2", DecomposeMode::Line).unwrap();

        assert_eq!(units.len(), 3);
        assert_eq!(units[1].text, "\n");
        assert_eq!(units[2].text, "b: 2");
        assert_eq!(units[2].start_line, 3);
        assert!(units.iter().all(|u| u.block_type == BlockType::Line));
    }

    #[test]
    fn test_blank_lines_join_following_unit() {
        let units = blocks("a: 1\n\n\nb: 2\n\n");

        assert_eq!(units.len(), 2);
        assert_eq!(units[1].text, "\n\nb: 2\n\n");
        assert_eq!(units[1].start_line, 2);
        assert_eq!(units[1].end_line, 5);
    }

    #[test]
    fn test_multiline_action_stays_in_one_unit() {
        let source = "{{- include \"chart.labels\" (dict\n  \"ctx\" .) | nindent 4 }}\nb: 2\n";
        let units = blocks(source);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].start_line, 1);
        assert_eq!(units[0].end_line, 2);
        assert_eq!(units[0].line_count(), 2);
        assert_eq!(units[0].block_type, BlockType::Include);
    }

    #[test]
    fn test_empty_source_yields_single_unit() {
        let units = blocks("");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "");
        assert_eq!(build(&units, 1), "");
    }

    #[test]
    fn test_stray_end_is_mismatched() {
        let err = decompose("a: 1\n{{ end }}\n", DecomposeMode::Block).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unclosed_if_is_mismatched() {
        let source = "a: 1\n{{ if .Values.enabled }}\nb: 2\n";
        let err = decompose(source, DecomposeMode::Block).unwrap_err();

        assert_eq!(err.line, 2);
        assert!(err.message.contains("never closed"));
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_line_mode_ignores_block_structure() {
        let source = "a: 1\n{{ if .Values.enabled }}\nb: 2\n";
        assert_eq!(decompose(source, DecomposeMode::Line).unwrap().len(), 3);
    }

    #[test]
    fn test_else_branch_keeps_block_open() {
        let source = "{{ if .Values.a }}\nx: 1\n{{ else if .Values.b }}\nx: 2\n{{ else }}\nx: 3\n{{ end }}\n";
        let units = blocks(source);

        assert_eq!(units[2].block_type, BlockType::ElseIf);
        assert_eq!(units[4].block_type, BlockType::Else);
        assert_eq!(stack_after(&units, 5).depth(), 1);
    }

    #[test]
    fn test_strings_and_comments_are_not_actions() {
        let scan = scan_actions("a: {{ printf \"}} {{ if\" }} {{/* range here */}} {{ `{{ end }}` }}\n");

        assert!(!scan.unterminated);
        assert_eq!(scan.actions.len(), 3);
        assert_eq!(scan.events().count(), 0);
        assert_eq!(scan.actions[1].block_type, BlockType::Comment);
    }

    #[test]
    fn test_trim_markers_recorded_on_open() {
        let scan = scan_actions("{{- with .Values.x -}}");
        assert_eq!(
            scan.actions[0].event,
            Some(ControlEvent::Open {
                kind: ControlKind::With,
                trim_left: true
            })
        );
    }

    #[test]
    fn test_stack_rejects_close_when_empty() {
        let mut stack = ControlBlockStack::new();
        assert!(stack.apply(ControlEvent::Close, 4).is_err());
        assert!(stack.apply(ControlEvent::Branch, 4).is_err());
    }
}

#[cfg(test)]
mod truncation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_range_gets_one_closer() {
        let units = blocks(CONFIGMAP);
        let candidate = build(&units, 7);

        assert!(candidate.ends_with("{{- end }}\n"));
        assert_eq!(candidate.matches("end }}").count(), 1);
        assert!(stack_after(&blocks(&candidate), 8).is_empty());
    }

    #[test]
    fn test_closers_innermost_first() {
        let source = "{{- range .Values.items }}\n{{ if .enabled }}\nname: {{ .name }}\n{{ end }}\n{{- end }}\n";
        let units = blocks(source);
        let candidate = build(&units, 3);

        assert_eq!(
            candidate,
            "{{- range .Values.items }}\n{{ if .enabled }}\nname: {{ .name }}\n{{ end }}\n{{- end }}\n"
        );

        let candidate = build(&units, 2);
        assert_eq!(
            candidate,
            "{{- range .Values.items }}\n{{ if .enabled }}\n{{ end }}\n{{- end }}\n"
        );
    }

    #[test]
    fn test_closer_added_on_new_line() {
        let units = blocks("{{ if .Values.a }}\nx: 1\n{{ end }}");
        assert_eq!(build(&units, 2), "{{ if .Values.a }}\nx: 1\n{{ end }}\n");
        assert_eq!(build(&units, 3), "{{ if .Values.a }}\nx: 1\n{{ end }}");
    }

    #[test]
    fn test_zero_prefix_is_empty() {
        let units = blocks(CONFIGMAP);
        assert_eq!(build(&units, 0), "");
    }

    #[test]
    fn test_line_mode_is_plain_prefix() {
        let units = decompose(CONFIGMAP, DecomposeMode::Line).unwrap();
        assert_eq!(
            build(&units, 6),
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {{ .Release.Name }}\ndata:\n{{- range $k, $v := .Values.data }}\n"
        );
    }

    #[test]
    fn test_range_labels() {
        let units = blocks(CONFIGMAP);
        assert_eq!(range_label(&units, 0), "none");
        assert_eq!(range_label(&units, 3), "0-2");

        let lines = decompose(CONFIGMAP, DecomposeMode::Line).unwrap();
        assert_eq!(range_label(&lines, 5), "1-5");
    }
}
