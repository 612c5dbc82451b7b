//! Server-rendered HTML pages
//!
//! Small enough to build with `format!`; no template engine.

use std::collections::HashMap;

use crate::model::ShortUrlRecord;

fn layout(title: &str, user_email: Option<&str>, body: &str) -> String {
    let nav = match user_email {
        Some(email) => format!(
            r#"<span>{email}</span> <form method="post" action="/logout" style="display:inline"><button>Log out</button></form>"#
        ),
        None => r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string(),
    };

    format!(
        "<!DOCTYPE html>\n<html><head><title>{title} - TinyApp</title></head>\n\
         <body><header><a href=\"/urls\">TinyApp</a> | {nav}</header>\n\
         <main>{body}</main></body></html>\n"
    )
}

fn error_banner(message: Option<&str>) -> String {
    match message {
        Some(message) => format!("<p class=\"error\">{message}</p>"),
        None => String::new(),
    }
}

/// The authenticated user's URL listing
pub fn urls_index(user_email: &str, urls: &HashMap<String, ShortUrlRecord>) -> String {
    let mut rows = String::new();
    for (code, record) in urls {
        rows.push_str(&format!(
            "<tr><td><a href=\"/urls/{code}\">{code}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            record.long_url,
            record.total_visits(),
            record.unique_visitors(),
        ));
    }

    layout(
        "My URLs",
        Some(user_email),
        &format!(
            "<h1>My URLs</h1><p><a href=\"/urls/new\">Shorten a new URL</a></p>\
             <table><tr><th>Code</th><th>Long URL</th><th>Visits</th><th>Unique visitors</th></tr>{rows}</table>"
        ),
    )
}

/// Creation form for a new short URL
pub fn new_url(user_email: &str, error: Option<&str>) -> String {
    layout(
        "New URL",
        Some(user_email),
        &format!(
            "<h1>Shorten a URL</h1>{}\
             <form method=\"post\" action=\"/urls\">\
             <label>Long URL <input type=\"text\" name=\"long_url\"></label>\
             <button>Create</button></form>",
            error_banner(error)
        ),
    )
}

/// Detail page for one short URL: visit metrics plus the edit form
pub fn url_show(user_email: &str, code: &str, record: &ShortUrlRecord, error: Option<&str>) -> String {
    layout(
        code,
        Some(user_email),
        &format!(
            "<h1>{code}</h1>{}\
             <p>Short link: <a href=\"/u/{code}\">/u/{code}</a></p>\
             <p>Destination: {}</p>\
             <p>Visits: {} | Unique visitors: {}</p>\
             <form method=\"post\" action=\"/urls/{code}\">\
             <label>New long URL <input type=\"text\" name=\"long_url\" value=\"{}\"></label>\
             <button>Update</button></form>\
             <form method=\"post\" action=\"/urls/{code}/delete\"><button>Delete</button></form>",
            error_banner(error),
            record.long_url,
            record.total_visits(),
            record.unique_visitors(),
            record.long_url,
        ),
    )
}

/// Login form
pub fn login(error: Option<&str>) -> String {
    layout(
        "Log in",
        None,
        &format!(
            "<h1>Log in</h1>{}\
             <form method=\"post\" action=\"/login\">\
             <label>Email <input type=\"email\" name=\"email\"></label>\
             <label>Password <input type=\"password\" name=\"password\"></label>\
             <button>Log in</button></form>",
            error_banner(error)
        ),
    )
}

/// Registration form
pub fn register(error: Option<&str>) -> String {
    layout(
        "Register",
        None,
        &format!(
            "<h1>Register</h1>{}\
             <form method=\"post\" action=\"/register\">\
             <label>Email <input type=\"email\" name=\"email\"></label>\
             <label>Password <input type=\"password\" name=\"password\"></label>\
             <button>Register</button></form>",
            error_banner(error)
        ),
    )
}
