use axum::response::Html;
use tera::{Context, Tera};

pub mod session;

pub use session::{get_current_user_id, is_logged_in, set_user_session};

pub fn render_template(tera: &Tera, template_name: &str, context: Context) -> Html<String> {
    Html(
        tera.render(template_name, &context)
            .unwrap_or_else(|_| format!("Error rendering template: {}", template_name)),
    )
}
