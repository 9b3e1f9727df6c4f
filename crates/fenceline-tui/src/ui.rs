use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use fenceline_core::business::{
    AppointmentStatus, AppointmentType, BusinessDataSnapshot, CustomerStatus, QuoteStatus,
};
use fenceline_core::{ChatRole, Provider, Route, SnapshotSource};

use crate::app::{App, InputMode};

/// Row style for the entity the assistant pointed at
fn highlight_style() -> Style {
    Style::default()
        .bg(Color::Yellow)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

/// Whole dollars with thousands separators, e.g. `$12,500`
fn format_money(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if end == 0 {
            // "****" is not bold, keep it literal
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &after[2..];
            continue;
        }
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after[..end].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let (open, minimized) = {
        let state = app.assistant.state();
        (state.open, state.minimized)
    };
    if open && !minimized {
        let [view_area, panel_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body_area);
        render_view(app, frame, view_area);
        render_assistant_panel(app, frame, panel_area);
    } else if open {
        let [view_area, bar_area] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(body_area);
        render_view(app, frame, view_area);
        render_minimized_bar(app, frame, bar_area);
    } else {
        render_view(app, frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_view(app: &mut App, frame: &mut Frame, area: Rect) {
    let data = app.data.snapshot();
    match app.route {
        Route::Dashboard => render_dashboard(app, &data, frame, area),
        Route::Quotes => render_quotes(app, &data, frame, area),
        Route::Customers => render_customers(app, &data, frame, area),
        Route::Schedule => render_schedule(app, &data, frame, area),
        Route::Settings => render_settings(app, frame, area),
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Fenceline ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ];

    for (i, route) in Route::ALL.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, route.title());
        let style = if *route == app.route {
            Style::default().bg(Color::Cyan).fg(Color::Black).bold()
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(label, style));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
        InputMode::NewCustomer => Style::default().bg(Color::Magenta).fg(Color::White),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => format!(" {} ", app.route.title().to_uppercase()),
        InputMode::Editing => " ASK ".to_string(),
        InputMode::NewCustomer => " NEW CUSTOMER ".to_string(),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = match app.input_mode {
        InputMode::NewCustomer => vec![
            Span::styled(
                if app.form.is_empty() {
                    "name; email; phone; address; notes".to_string()
                } else {
                    format!("{}_", app.form)
                },
                Style::default().bg(Color::Black).fg(Color::Cyan),
            ),
            Span::styled(" ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" add ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Shift+Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" 1-5 ", key_style),
                Span::styled(" views ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" assistant ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" minimize ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
            ];
            if app.route == Route::Customers {
                hints.extend(vec![
                    Span::styled(" n ", key_style),
                    Span::styled(" new customer ", label_style),
                ]);
            }
            if app.route == Route::Settings {
                hints.extend(vec![
                    Span::styled(" p ", key_style),
                    Span::styled(" provider ", label_style),
                    Span::styled(" t ", key_style),
                    Span::styled(" speech ", label_style),
                ]);
            }
            if app.assistant.can_listen() {
                hints.extend(vec![
                    Span::styled(" v ", key_style),
                    Span::styled(
                        if app.assistant.state().listening {
                            " stop listening "
                        } else {
                            " voice "
                        },
                        label_style,
                    ),
                ]);
            }
            if app.assistant.state().speaking {
                hints.extend(vec![
                    Span::styled(" s ", key_style),
                    Span::styled(" stop speaking ", label_style),
                ]);
            }
            hints.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
            hints
        }
    };

    if let Some(status) = &app.status {
        hints.push(Span::styled(
            format!(" {} ", status),
            Style::default().bg(Color::Black).fg(Color::Red),
        ));
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn view_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", title))
}

fn quote_status(status: QuoteStatus) -> (&'static str, Color) {
    match status {
        QuoteStatus::Pending => ("pending", Color::Yellow),
        QuoteStatus::Approved => ("approved", Color::Green),
        QuoteStatus::Rejected => ("rejected", Color::Red),
        QuoteStatus::Completed => ("completed", Color::Blue),
    }
}

fn customer_status(status: CustomerStatus) -> (&'static str, Color) {
    match status {
        CustomerStatus::Active => ("active", Color::Green),
        CustomerStatus::Inactive => ("inactive", Color::DarkGray),
        CustomerStatus::Prospect => ("prospect", Color::Magenta),
    }
}

fn appointment_type(kind: AppointmentType) -> &'static str {
    match kind {
        AppointmentType::Consultation => "consultation",
        AppointmentType::Installation => "installation",
        AppointmentType::Maintenance => "maintenance",
        AppointmentType::Estimate => "estimate",
    }
}

fn appointment_status(status: AppointmentStatus) -> (&'static str, Color) {
    match status {
        AppointmentStatus::Scheduled => ("scheduled", Color::Cyan),
        AppointmentStatus::Completed => ("completed", Color::Green),
        AppointmentStatus::Cancelled => ("cancelled", Color::Red),
    }
}

fn render_dashboard(
    app: &mut App,
    data: &BusinessDataSnapshot,
    frame: &mut Frame,
    area: Rect,
) {
    let [stats_area, lists_area] =
        Layout::vertical([Constraint::Length(7), Constraint::Min(0)]).areas(area);
    let [quotes_area, schedule_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .areas(lists_area);

    let summary = &data.summary;
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).bold();
    let stat = |name: &'static str, v: String| {
        vec![Span::styled(format!("{:<22}", name), label), Span::styled(v, value)]
    };

    let mut first = stat("Quotes", summary.total_quotes.to_string());
    first.extend(stat(
        "   Pending / approved",
        format!("{} / {}", summary.pending_quotes, summary.approved_quotes),
    ));
    let mut second = stat("Customers", summary.total_customers.to_string());
    second.extend(stat(
        "   Active / prospects",
        format!("{} / {}", summary.active_customers, summary.prospect_customers),
    ));
    let mut third = stat(
        "Upcoming appointments",
        summary.upcoming_appointments.to_string(),
    );
    third.extend(stat("   Active projects", summary.active_projects.to_string()));
    let mut fourth = stat("Revenue (completed)", format_money(summary.total_revenue));
    fourth.extend(stat(
        "   Pending revenue",
        format_money(summary.pending_revenue),
    ));

    let stats = Paragraph::new(vec![
        Line::from(first),
        Line::from(second),
        Line::from(third),
        Line::from(fourth),
    ])
    .block(view_block("Dashboard"));
    frame.render_widget(stats, stats_area);

    let quote_rows: Vec<Row> = data
        .quotes
        .iter()
        .take(5)
        .map(|q| {
            let (status, color) = quote_status(q.status);
            let row = Row::new(vec![
                Cell::from(q.customer_name.clone()),
                Cell::from(format_money(q.amount)),
                Cell::from(Span::styled(status, Style::default().fg(color))),
            ]);
            if app.is_highlighted(&q.id) {
                row.style(highlight_style())
            } else {
                row
            }
        })
        .collect();
    let recent_quotes = Table::new(
        quote_rows,
        [
            Constraint::Percentage(50),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .block(view_block("Recent quotes"));
    frame.render_widget(recent_quotes, quotes_area);

    let schedule_rows: Vec<Row> = data
        .schedule
        .iter()
        .filter(|s| s.status == AppointmentStatus::Scheduled)
        .take(5)
        .map(|s| {
            let row = Row::new(vec![
                Cell::from(format!("{} {}", s.date, s.time)),
                Cell::from(s.title.clone()),
            ]);
            if app.is_highlighted(&s.id) {
                row.style(highlight_style())
            } else {
                row
            }
        })
        .collect();
    let upcoming = Table::new(
        schedule_rows,
        [Constraint::Length(18), Constraint::Min(0)],
    )
    .block(view_block("Upcoming"));
    frame.render_widget(upcoming, schedule_area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(titles.iter().map(|t| Cell::from(*t)).collect::<Vec<_>>())
        .style(Style::default().fg(Color::Cyan).bold())
        .bottom_margin(1)
}

fn render_quotes(
    app: &mut App,
    data: &BusinessDataSnapshot,
    frame: &mut Frame,
    area: Rect,
) {
    let rows: Vec<Row> = data
        .quotes
        .iter()
        .map(|q| {
            let (status, color) = quote_status(q.status);
            let row = Row::new(vec![
                Cell::from(q.id.clone()),
                Cell::from(q.customer_name.clone()),
                Cell::from(q.project_type.clone()),
                Cell::from(Span::styled(status, Style::default().fg(color))),
                Cell::from(format_money(q.amount)),
                Cell::from(q.date.clone()),
                Cell::from(q.location.clone()),
            ]);
            if app.is_highlighted(&q.id) {
                row.style(highlight_style())
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Min(0),
        ],
    )
    .header(header_row(&[
        "ID", "Customer", "Project", "Status", "Amount", "Date", "Location",
    ]))
    .block(view_block("Quotes"));
    frame.render_widget(table, area);
}

fn render_customers(
    app: &mut App,
    data: &BusinessDataSnapshot,
    frame: &mut Frame,
    area: Rect,
) {
    let rows: Vec<Row> = data
        .customers
        .iter()
        .map(|c| {
            let (status, color) = customer_status(c.status);
            let row = Row::new(vec![
                Cell::from(c.id.clone()),
                Cell::from(c.name.clone()),
                Cell::from(c.phone.clone()),
                Cell::from(c.projects.to_string()),
                Cell::from(format_money(c.total_spent)),
                Cell::from(Span::styled(status, Style::default().fg(color))),
                Cell::from(c.last_contact.clone()),
            ]);
            if app.is_highlighted(&c.id) {
                row.style(highlight_style())
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(18),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(0),
        ],
    )
    .header(header_row(&[
        "ID",
        "Name",
        "Phone",
        "Projects",
        "Spent",
        "Status",
        "Last contact",
    ]))
    .block(view_block("Customers"));
    frame.render_widget(table, area);
}

fn render_schedule(
    app: &mut App,
    data: &BusinessDataSnapshot,
    frame: &mut Frame,
    area: Rect,
) {
    let rows: Vec<Row> = data
        .schedule
        .iter()
        .map(|s| {
            let (status, color) = appointment_status(s.status);
            let row = Row::new(vec![
                Cell::from(s.id.clone()),
                Cell::from(s.date.clone()),
                Cell::from(s.time.clone()),
                Cell::from(s.title.clone()),
                Cell::from(s.customer.clone()),
                Cell::from(appointment_type(s.kind)),
                Cell::from(Span::styled(status, Style::default().fg(color))),
            ]);
            if app.is_highlighted(&s.id) {
                row.style(highlight_style())
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(13),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&[
        "ID", "Date", "Time", "Title", "Customer", "Type", "Status",
    ]))
    .block(view_block("Schedule"));
    frame.render_widget(table, area);
}

fn render_settings(app: &mut App, frame: &mut Frame, area: Rect) {
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).bold();
    let row = |name: &'static str, v: String| {
        Line::from(vec![Span::styled(format!("{:<20}", name), label), Span::styled(v, value)])
    };

    let key_status = |provider: Provider| match app.config.key_source(provider) {
        Some("env") => "env var".to_string(),
        Some(_) => "configured".to_string(),
        None if provider.needs_api_key() => "needs key".to_string(),
        None => format!("local ({})", app.config.ollama_url()),
    };

    let mut lines = vec![
        row("Provider", app.provider.display_name().to_string()),
        row(
            "Model",
            app.assistant
                .model_name()
                .unwrap_or("not configured")
                .to_string(),
        ),
        row(
            "Assistant",
            if app.assistant.is_configured() {
                "ready".to_string()
            } else {
                "not configured".to_string()
            },
        ),
        row(
            "Speak responses",
            if app.assistant.settings().speak_responses {
                "on".to_string()
            } else {
                "off".to_string()
            },
        ),
        row(
            "Voice input",
            if app.assistant.can_listen() {
                "available".to_string()
            } else {
                "unavailable".to_string()
            },
        ),
        row(
            "Voice output",
            if app.assistant.can_speak() {
                "available".to_string()
            } else {
                "unavailable".to_string()
            },
        ),
        row(
            "Log file",
            app.log_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stderr".to_string()),
        ),
        Line::default(),
        Line::from(Span::styled("Providers", Style::default().fg(Color::Cyan).bold())),
    ];

    for provider in Provider::all() {
        let marker = if provider == app.provider { "* " } else { "  " };
        let style = if provider == app.provider {
            Style::default().fg(Color::Green).bold()
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{}{} ({})", marker, provider.display_name(), key_status(provider)),
            style,
        )));
    }

    let settings = Paragraph::new(lines)
        .block(view_block("Settings"))
        .wrap(Wrap { trim: false });
    frame.render_widget(settings, area);
}

fn panel_title(app: &App) -> String {
    let model = app.assistant.model_name().unwrap_or("not configured");
    let state = app.assistant.state();
    let activity = if state.listening {
        " [listening]"
    } else if state.speaking {
        " [speaking]"
    } else {
        ""
    };
    format!(" Assistant: {}{} ", model, activity)
}

fn render_minimized_bar(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(panel_title(app));
    let hint = if app.assistant.state().loading {
        format!("Thinking{}", ".".repeat(app.animation_frame as usize + 1))
    } else {
        "Press m to expand".to_string()
    };
    let bar = Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))).block(block);
    frame.render_widget(bar, area);
}

fn render_assistant_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let editing = app.input_mode == InputMode::Editing;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Cyan } else { Color::DarkGray }))
        .title(panel_title(app));

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.messages() {
        match msg.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            ChatRole::Assistant => {
                lines.push(Line::from(Span::styled(
                    "AI:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.content.lines() {
                    lines.push(parse_markdown_line(line));
                }
                lines.push(Line::default());
            }
        }
    }

    if app.assistant.state().loading {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let input_title = if app.assistant.is_configured() {
        " Ask (i to type) "
    } else {
        " Assistant not configured "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(input_title);

    // Show the line the cursor is on, scrolled horizontally to keep it visible
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let input = app.assistant.input();
    let (line_start, cursor_col) = cursor_line(input, app.input_cursor);
    let scroll_offset = if inner_width == 0 || cursor_col < inner_width {
        0
    } else {
        cursor_col - inner_width + 1
    };
    let visible_text: String = input
        .chars()
        .skip(line_start)
        .take_while(|c| *c != '\n')
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input_widget = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input_widget, input_area);

    if editing {
        let cursor_x = (cursor_col - scroll_offset) as u16;
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

/// Char index where the cursor's line starts, and the cursor's column in it
fn cursor_line(input: &str, cursor: usize) -> (usize, usize) {
    let line_start = input
        .chars()
        .take(cursor)
        .enumerate()
        .filter(|(_, c)| *c == '\n')
        .last()
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    (line_start, cursor.saturating_sub(line_start))
}
