//! HTML rendering for the admin console

use std::fmt::Write;

use super::{BookAdmin, ChangeListParams, ListFilter, CHANGE_LIST_PATH};
use crate::{
    error::FieldErrors,
    models::{
        book::{Book, BookStatus, AUTHOR_MAX_LEN, TITLE_MAX_LEN},
        query::{replace_query_param, OrderField, OrderTerm, Paginated},
    },
};

const STYLE: &str = "body{font-family:sans-serif;margin:0}\
header{background:#417690;color:#fff;padding:10px 20px}\
header a{color:#fff;text-decoration:none}\
main{padding:20px;display:flex;gap:20px}\
.content{flex:1}\
table{border-collapse:collapse;width:100%}\
th,td{border-bottom:1px solid #ddd;padding:6px;text-align:left}\
#filters{min-width:180px;background:#f8f8f8;padding:10px}\
#filters a.selected{font-weight:bold}\
.errorlist{color:#ba2121;margin:0;padding-left:16px}\
.button{padding:4px 10px}";

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn column_label(field: OrderField) -> &'static str {
    match field {
        OrderField::Id => "ID",
        OrderField::Title => "Название книги",
        OrderField::Author => "Автор книги",
        OrderField::Year => "Год издания",
        OrderField::Status => "Статус",
    }
}

fn cell(book: &Book, field: OrderField) -> String {
    match field {
        OrderField::Id => book.id.to_string(),
        OrderField::Title => book.title.clone(),
        OrderField::Author => book.author.clone(),
        OrderField::Year => book.year.to_string(),
        OrderField::Status => book.status.to_string(),
    }
}

/// Wrap a body in the console layout
pub fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ru\"><head><meta charset=\"utf-8\">\
<title>{title} | Администрирование</title><style>{STYLE}</style></head>\
<body><header><a href=\"{CHANGE_LIST_PATH}\">Книги</a></header>{body}</body></html>",
        title = escape(title),
    )
}

/// Change list URL for the current query with some parameters replaced.
/// Any change to what is listed returns to the first page.
fn list_url(query: Option<&str>, changes: &[(&str, Option<&str>)]) -> String {
    let mut qs = query.unwrap_or_default().to_string();
    for (key, value) in changes {
        let encoded = value.map(|v| urlencoding::encode(v).into_owned());
        qs = replace_query_param(Some(qs.as_str()), key, encoded.as_deref());
    }
    if !changes.iter().any(|(key, _)| *key == "p") {
        qs = replace_query_param(Some(qs.as_str()), "p", None);
    }
    if qs.is_empty() {
        CHANGE_LIST_PATH.to_string()
    } else {
        format!("{}?{}", CHANGE_LIST_PATH, qs)
    }
}

/// Everything the change list page shows
pub struct ChangeList<'a> {
    pub admin: &'a BookAdmin,
    pub params: &'a ChangeListParams,
    pub page: &'a Paginated<Book>,
    /// Raw query string of the request, reused when building links
    pub query: Option<&'a str>,
    /// Years offered by the year filter
    pub years: &'a [i32],
}

impl ChangeList<'_> {
    pub fn render(&self) -> String {
        let mut body = String::from("<main><div class=\"content\">");
        body.push_str(
            "<h1>Выберите книгу для изменения</h1>\
<p><a class=\"button\" href=\"/admin/books/add/\">Добавить книгу</a></p>",
        );
        self.search_form(&mut body);
        self.table(&mut body);
        self.paginator(&mut body);
        body.push_str("</div>");
        self.filters(&mut body);
        body.push_str("</main>");
        layout("Книги", &body)
    }

    fn search_form(&self, out: &mut String) {
        let _ = write!(
            out,
            "<form id=\"changelist-search\" method=\"get\" action=\"{}\">\
<input type=\"text\" name=\"q\" value=\"{}\"> <input type=\"submit\" value=\"Найти\">",
            CHANGE_LIST_PATH,
            escape(&self.params.search)
        );
        // Keep the active filters and ordering across searches
        if let Some(status) = self.params.status {
            let _ = write!(out, "<input type=\"hidden\" name=\"status\" value=\"{}\">", escape(status.as_str()));
        }
        if let Some(year) = self.params.year {
            let _ = write!(out, "<input type=\"hidden\" name=\"year\" value=\"{}\">", year);
        }
        let ordering: Vec<String> = self.params.ordering.iter().map(OrderTerm::as_param).collect();
        let _ = write!(
            out,
            "<input type=\"hidden\" name=\"o\" value=\"{}\"></form>",
            escape(&ordering.join(","))
        );
    }

    fn table(&self, out: &mut String) {
        out.push_str("<table id=\"result_list\"><thead><tr>");
        let primary = self.params.ordering.first();
        for &field in self.admin.list_display {
            // Clicking the primary sort column flips its direction
            let next = match primary {
                Some(term) if term.field == field && !term.descending => OrderTerm::desc(field),
                _ => OrderTerm::asc(field),
            };
            let marker = match primary {
                Some(term) if term.field == field => {
                    if term.descending {
                        " ▼"
                    } else {
                        " ▲"
                    }
                }
                _ => "",
            };
            let href = list_url(self.query, &[("o", Some(next.as_param().as_str()))]);
            let _ = write!(
                out,
                "<th><a href=\"{}\">{}</a>{}</th>",
                escape(&href),
                column_label(field),
                marker
            );
        }
        out.push_str("</tr></thead><tbody>");
        for book in &self.page.results {
            out.push_str("<tr>");
            for (i, &field) in self.admin.list_display.iter().enumerate() {
                let text = escape(&cell(book, field));
                if i == 0 {
                    let _ = write!(out, "<td><a href=\"/admin/books/{}/change/\">{}</a></td>", book.id, text);
                } else {
                    let _ = write!(out, "<td>{}</td>", text);
                }
            }
            out.push_str("</tr>");
        }
        out.push_str("</tbody></table>");
    }

    fn paginator(&self, out: &mut String) {
        let page = self.page;
        out.push_str("<p class=\"paginator\">");
        if let Some(prev) = page.previous_number() {
            let href = list_url(self.query, &[("p", Some(prev.to_string().as_str()))]);
            let _ = write!(out, "<a href=\"{}\">&laquo;</a> ", escape(&href));
        }
        let _ = write!(out, "Страница {} из {} ", page.number, page.num_pages);
        if let Some(next) = page.next_number() {
            let href = list_url(self.query, &[("p", Some(next.to_string().as_str()))]);
            let _ = write!(out, "<a href=\"{}\">&raquo;</a> ", escape(&href));
        }
        let _ = write!(out, "&middot; книг: {}</p>", page.count);
    }

    fn filters(&self, out: &mut String) {
        if self.admin.list_filter.is_empty() {
            return;
        }
        out.push_str("<div id=\"filters\"><h2>Фильтр</h2>");
        for &filter in self.admin.list_filter {
            let (label, selected, choices): (&str, Option<String>, Vec<String>) = match filter {
                ListFilter::Status => (
                    "Статус",
                    self.params.status.map(|s| s.as_str().to_string()),
                    BookStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
                ),
                ListFilter::Year => (
                    "Год издания",
                    self.params.year.map(|y| y.to_string()),
                    self.years.iter().map(|y| y.to_string()).collect(),
                ),
            };
            let _ = write!(out, "<h3>По {}</h3><ul>", label.to_lowercase());
            let all = list_url(self.query, &[(filter.param(), None)]);
            let _ = write!(
                out,
                "<li><a href=\"{}\"{}>Все</a></li>",
                escape(&all),
                if selected.is_none() { " class=\"selected\"" } else { "" }
            );
            for choice in &choices {
                let href = list_url(self.query, &[(filter.param(), Some(choice.as_str()))]);
                let class = if selected.as_deref() == Some(choice.as_str()) {
                    " class=\"selected\""
                } else {
                    ""
                };
                let _ = write!(
                    out,
                    "<li><a href=\"{}\"{}>{}</a></li>",
                    escape(&href),
                    class,
                    escape(choice)
                );
            }
            out.push_str("</ul>");
        }
        out.push_str("</div>");
    }
}

/// Raw (possibly invalid) form contents as shown in the inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub title: String,
    pub author: String,
    pub year: String,
    pub status: String,
}

impl FormValues {
    pub fn initial() -> Self {
        Self {
            status: BookStatus::default().as_str().to_string(),
            ..Default::default()
        }
    }
}

impl From<&Book> for FormValues {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            status: book.status.as_str().to_string(),
        }
    }
}

fn error_list(errors: &FieldErrors, field: &str) -> String {
    match errors.get(field) {
        Some(messages) if !messages.is_empty() => {
            let items: String = messages
                .iter()
                .map(|m| format!("<li>{}</li>", escape(m)))
                .collect();
            format!("<ul class=\"errorlist\">{}</ul>", items)
        }
        _ => String::new(),
    }
}

/// The add/change form. `book` is the record being edited, if any.
pub fn book_form(book: Option<&Book>, values: &FormValues, errors: &FieldErrors) -> String {
    let (heading, action) = match book {
        Some(book) => (
            format!("Изменить книгу «{}»", book),
            format!("/admin/books/{}/change/", book.id),
        ),
        None => ("Добавить книгу".to_string(), "/admin/books/add/".to_string()),
    };

    let mut body = String::from("<main><div class=\"content\">");
    let _ = write!(body, "<h1>{}</h1>", escape(&heading));
    if !errors.is_empty() {
        body.push_str("<p class=\"errornote\">Пожалуйста, исправьте ошибки ниже.</p>");
        body.push_str(&error_list(errors, FieldErrors::NON_FIELD));
    }
    let _ = write!(body, "<form method=\"post\" action=\"{}\">", action);

    let _ = write!(
        body,
        "<p><label for=\"id_title\">Название книги:</label>{}\
<input type=\"text\" name=\"title\" id=\"id_title\" maxlength=\"{}\" value=\"{}\" required></p>",
        error_list(errors, "title"),
        TITLE_MAX_LEN,
        escape(&values.title)
    );
    let _ = write!(
        body,
        "<p><label for=\"id_author\">Автор книги:</label>{}\
<input type=\"text\" name=\"author\" id=\"id_author\" maxlength=\"{}\" value=\"{}\" required></p>",
        error_list(errors, "author"),
        AUTHOR_MAX_LEN,
        escape(&values.author)
    );
    let _ = write!(
        body,
        "<p><label for=\"id_year\">Год издания:</label>{}\
<input type=\"number\" name=\"year\" id=\"id_year\" value=\"{}\" required></p>",
        error_list(errors, "year"),
        escape(&values.year)
    );

    let _ = write!(
        body,
        "<p><label for=\"id_status\">Статус:</label>{}<select name=\"status\" id=\"id_status\">",
        error_list(errors, "status")
    );
    for status in BookStatus::ALL {
        let selected = if values.status == status.as_str() { " selected" } else { "" };
        let _ = write!(
            body,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(status.as_str()),
            selected
        );
    }
    body.push_str("</select></p><p><input type=\"submit\" value=\"Сохранить\"></p></form>");

    if let Some(book) = book {
        let _ = write!(
            body,
            "<p><a href=\"/admin/books/{}/delete/\">Удалить</a></p>",
            book.id
        );
    }
    body.push_str("</div></main>");
    layout(&heading, &body)
}

pub fn delete_confirmation(book: &Book) -> String {
    let mut body = String::from("<main><div class=\"content\">");
    let _ = write!(
        body,
        "<h1>Вы уверены?</h1><p>Вы уверены, что хотите удалить книгу «{}»?</p>\
<form method=\"post\" action=\"/admin/books/{}/delete/\">\
<input type=\"submit\" value=\"Да, я уверен\"> \
<a href=\"/admin/books/{}/change/\">Нет, отменить</a></form></div></main>",
        escape(&book.to_string()),
        book.id,
        book.id
    );
    layout("Удаление книги", &body)
}

/// Shown when a book id names no record
pub fn not_found() -> String {
    layout(
        "Страница не найдена",
        "<main><div class=\"content\"><h1>Страница не найдена</h1>\
<p>Запрошенная книга не существует.</p>\
<p><a href=\"/admin/books/\">Вернуться к списку книг</a></p></div></main>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AdminConfig, models::query::QueryParams};

    fn book(id: i32, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Tolstoy".to_string(),
            year: 1869,
            status: BookStatus::Available,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_list_url_keeps_other_params_and_resets_page() {
        assert_eq!(
            list_url(Some("q=war&p=3"), &[("status", Some("Выдана"))]),
            "/admin/books/?q=war&status=%D0%92%D1%8B%D0%B4%D0%B0%D0%BD%D0%B0"
        );
        assert_eq!(list_url(Some("p=2"), &[("p", Some("3"))]), "/admin/books/?p=3");
        assert_eq!(list_url(Some("year=1869"), &[("year", None)]), "/admin/books/");
    }

    #[test]
    fn test_change_list_renders_rows_escaped() {
        let admin = BookAdmin::new(&AdminConfig::default());
        let params = ChangeListParams::from_params(&QueryParams::default(), &admin);
        let page = Paginated {
            count: 1,
            number: 1,
            num_pages: 1,
            results: vec![book(7, "War <and> Peace")],
        };
        let html = ChangeList {
            admin: &admin,
            params: &params,
            page: &page,
            query: None,
            years: &[1869],
        }
        .render();

        assert!(html.contains("<a href=\"/admin/books/7/change/\">7</a>"));
        assert!(html.contains("War &lt;and&gt; Peace"));
        assert!(!html.contains("War <and> Peace"));
        assert!(html.contains("?year=1869"));
        assert!(html.contains("книг: 1"));
        // Title is the default sort, so its header offers the descending order
        assert!(html.contains("href=\"/admin/books/?o=-title\""));
    }

    #[test]
    fn test_form_shows_errors_and_submitted_values() {
        let mut errors = FieldErrors::new();
        errors.add("year", "A valid integer is required.");
        let values = FormValues {
            title: "Dune".into(),
            author: "Herbert".into(),
            year: "soon".into(),
            status: "Выдана".into(),
        };
        let html = book_form(None, &values, &errors);

        assert!(html.contains("A valid integer is required."));
        assert!(html.contains("value=\"soon\""));
        assert!(html.contains("<option value=\"Выдана\" selected>"));
        assert!(html.contains("action=\"/admin/books/add/\""));
    }

    #[test]
    fn test_initial_form_selects_available() {
        let html = book_form(None, &FormValues::initial(), &FieldErrors::new());
        assert!(html.contains("<option value=\"В наличии\" selected>"));
        assert!(!html.contains("errornote"));
    }

    #[test]
    fn test_not_found_page_links_back() {
        let html = not_found();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("href=\"/admin/books/\""));
    }

    #[test]
    fn test_delete_confirmation_names_book() {
        let html = delete_confirmation(&book(3, "Anna Karenina"));
        assert!(html.contains("«Anna Karenina»"));
        assert!(html.contains("action=\"/admin/books/3/delete/\""));
    }
}
