mod challenge;
mod log_viewer;

pub use challenge::*;
pub use log_viewer::*;

use web_sys::HtmlInputElement;
use yew::prelude::*;

/// A simple, styled button.
#[derive(Properties, PartialEq)]
pub struct ButtonProps {
    /// Button label text
    pub label: AttrValue,
    /// Click handler
    pub onclick: Callback<MouseEvent>,
    /// Disable state
    #[prop_or_default]
    pub disabled: bool,
    /// Extra classes, e.g. `mpgs-button-secondary`
    #[prop_or_default]
    pub class: Classes,
}

#[function_component(Button)]
pub fn button(props: &ButtonProps) -> Html {
    html! {
        <button
            type="button"
            onclick={props.onclick.clone()}
            disabled={props.disabled}
            class={classes!("mpgs-button", props.class.clone())}
        >
            { props.label.clone() }
        </button>
    }
}

/// A labelled, controlled text input.
#[derive(Properties, PartialEq)]
pub struct TextInputProps {
    pub label: AttrValue,
    /// Current value
    pub value: String,
    /// Emits new value on each keystroke
    pub oninput: Callback<String>,
    #[prop_or_default]
    pub placeholder: AttrValue,
    /// `text`, `password`, `url`...
    #[prop_or(AttrValue::Static("text"))]
    pub input_type: AttrValue,
    /// Small print under the input.
    #[prop_or_default]
    pub hint: Option<AttrValue>,
}

#[function_component(TextInput)]
pub fn text_input(props: &TextInputProps) -> Html {
    let oninput = props.oninput.clone();
    html! {
        <label class="mpgs-field">
            <span class="mpgs-field-label">{ props.label.clone() }</span>
            <input
                type={props.input_type.clone()}
                class="mpgs-text-input"
                value={props.value.clone()}
                placeholder={props.placeholder.clone()}
                oninput={Callback::from(move |e: InputEvent| {
                    let input: HtmlInputElement = e.target_unchecked_into();
                    oninput.emit(input.value());
                })}
            />
            if let Some(hint) = &props.hint {
                <small class="mpgs-field-hint">{ hint }</small>
            }
        </label>
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            BannerKind::Info => "mpgs-banner-info",
            BannerKind::Success => "mpgs-banner-success",
            BannerKind::Error => "mpgs-banner-error",
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct BannerProps {
    pub kind: BannerKind,
    pub message: AttrValue,
    #[prop_or_default]
    pub children: Children,
}

/// Status line shown above a form.
#[function_component(Banner)]
pub fn banner(props: &BannerProps) -> Html {
    html! {
        <div class={classes!("mpgs-banner", props.kind.class())} role="status">
            <span>{ props.message.clone() }</span>
            { for props.children.iter() }
        </div>
    }
}
