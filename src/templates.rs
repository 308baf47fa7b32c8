use handlebars::{handlebars_helper, Handlebars, RenderError, TemplateError};
use serde::Serialize;

pub const INDEX: &str = "polls/index";
pub const DETAIL: &str = "polls/detail";
pub const RESULTS: &str = "polls/results";

/**
 * Page templates are compiled into the binary so the server has no runtime file dependencies
 */
const SOURCES: &[(&str, &str)] = &[
    (INDEX, include_str!("../templates/polls/index.hbs")),
    (DETAIL, include_str!("../templates/polls/detail.hbs")),
    (RESULTS, include_str!("../templates/polls/results.hbs")),
];

handlebars_helper!(pluralize: |count: i64| if count == 1 { "" } else { "s" });
handlebars_helper!(url: |name: str, id: i64| crate::urls::reverse_named(name, id));

#[derive(Debug)]
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_helper("pluralize", Box::new(pluralize));
        registry.register_helper("url", Box::new(url));

        for (name, source) in SOURCES.iter() {
            registry.register_template_string(name, source)?;
        }
        Ok(Templates { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, RenderError> {
        self.registry.render(name, data)
    }
}
