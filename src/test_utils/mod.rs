#![allow(missing_docs)]

pub(crate) mod extract;
pub(crate) mod fixtures;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use extract::{extract_form, extract_query};
pub(crate) use fixtures::{get_test_connection, get_test_state, must_create_rule, rent_form};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_input_with_value,
    assert_form_submit_button, assert_form_submit_button_with_text, assert_hx_endpoint,
    assert_selected_option, must_get_form,
};
pub(crate) use html::{
    assert_alert_contains, assert_valid_html, parse_html_document, parse_html_fragment,
};
pub(crate) use http::{assert_content_type, assert_hx_redirect, assert_status_ok, get_header};
