//! Transactions page rendering
//!
//! Full page:
//! - render_index: console shell that loads the list on page load
//!
//! Fragments:
//! - render_list / render_row / render_heading / render_footer: transaction list
//! - render_filter_modal / render_day_select: filter editor
//! - render_editor_modal / render_status_badge / render_fraud_banner: detail editor

use isocountry::CountryCode;
use txconsole_core::models::parse_datetime;
use txconsole_core::time::{days_in_month, display_datetime, month_name, period_label, selectable_years};
use txconsole_core::{FieldKind, Filter, SaveStatus, Transaction, TransactionField, TransactionList};
use txconsole_config::PageSize;
use txconsole_utils::{escape_html, format_number, format_usd};

const ROW_GRID: &str = "grid grid-cols-8 gap-2 px-4 py-2";

fn selected(is: bool) -> &'static str {
    if is {
        "selected"
    } else {
        ""
    }
}

fn oob_attr(oob: bool) -> &'static str {
    if oob {
        "hx-swap-oob='true'"
    } else {
        ""
    }
}

/// Console shell; the list loads itself once the page is shown
pub fn render_index() -> String {
    r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Transactions</h2>
            <button hx-get='/transactions/filter/editor' hx-target='#modal-root'
                class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700 flex items-center gap-2'>
                <svg xmlns='http://www.w3.org/2000/svg' class='h-5 w-5' fill='none' viewBox='0 0 24 24' stroke='currentColor'>
                    <path stroke-linecap='round' stroke-linejoin='round' stroke-width='2' d='M3 4h18l-7 8v6l-4 2v-8L3 4z'/>
                </svg>
                Filter
            </button>
        </div>
        <div id='transactions-content' hx-get='/transactions/list' hx-trigger='load'>
            <p class='text-gray-500 text-center py-12'>Loading...</p>
        </div>"#
        .to_string()
}

// ==================== Transaction List ====================

pub fn render_heading(list: &TransactionList, oob: bool) -> String {
    format!(
        "<h3 id='list-heading' {} class='text-lg font-semibold mb-3'>Showing {} results for {}</h3>",
        oob_attr(oob),
        format_number(list.rows().len()),
        escape_html(&period_label(list.filter()))
    )
}

fn fraud_tag(tx: &Transaction) -> &'static str {
    if tx.is_flagged_fraud() {
        "<span class='px-2 py-0.5 rounded-full text-xs bg-red-100 text-red-700'>Fraud</span>"
    } else {
        "<span class='px-2 py-0.5 rounded-full text-xs bg-green-100 text-green-700'>Not Fraud</span>"
    }
}

fn status_tag(tx: &Transaction) -> String {
    let class = if tx.deleted {
        "bg-gray-200 text-gray-600"
    } else {
        "bg-indigo-100 text-indigo-700"
    };
    format!(
        "<span class='px-2 py-0.5 rounded-full text-xs {}'>{}</span>",
        class,
        tx.status_label()
    )
}

/// One clickable list row; `oob` marks it for an out-of-band replacement
pub fn render_row(tx: &Transaction, oob: bool) -> String {
    format!(
        r#"<div id='tx-row-{id}' {oob} role='row' class='{grid} border-b text-sm hover:bg-indigo-50 cursor-pointer'
    hx-get='/transactions/{id}/editor' hx-target='#modal-root'>
    <div>{account}</div><div>{customer}</div><div>{time}</div><div class='truncate'>{merchant}</div>
    <div>{kind}</div><div>{fraud}</div><div class='text-right font-medium'>{amount}</div><div>{status}</div>
</div>"#,
        id = tx.id,
        oob = oob_attr(oob),
        grid = ROW_GRID,
        account = escape_html(&tx.account_number),
        customer = escape_html(&tx.customer_id),
        time = escape_html(&display_datetime(&tx.transaction_date_time)),
        merchant = escape_html(&tx.merchant_name),
        kind = escape_html(&tx.transaction_type),
        fraud = fraud_tag(tx),
        amount = format_usd(tx.transaction_amount),
        status = status_tag(tx),
    )
}

pub fn render_rows(rows: &[Transaction]) -> String {
    rows.iter().map(|tx| render_row(tx, false)).collect()
}

/// Rows appended to the list body out of band
pub fn render_appended_rows(rows: &[Transaction]) -> String {
    format!(
        "<div hx-swap-oob='beforeend:#transaction-rows'>{}</div>",
        render_rows(rows)
    )
}

/// Footer with the "Load More" control, offered only when another page exists
pub fn render_footer(list: &TransactionList, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class='text-sm text-red-600 mb-2'>{}</p>", escape_html(e)))
        .unwrap_or_default();
    let button = if list.has_more() && !list.rows().is_empty() {
        r#"<button hx-get='/transactions/more' hx-target='#list-footer' hx-swap='outerHTML' hx-disabled-elt='this'
            class='px-4 py-2 border rounded-lg hover:bg-gray-50'>Load More <span class='htmx-indicator'>...</span></button>"#
    } else {
        ""
    };
    format!("<div id='list-footer' class='mt-4 text-center'>{}{}</div>", error, button)
}

pub fn render_list(list: &TransactionList) -> String {
    if !list.is_loaded() {
        return "<div id='transactions-list'><p class='text-gray-500 text-center py-12'>Loading...</p></div>".to_string();
    }
    let body = if list.rows().is_empty() {
        "<div class='text-center py-12 text-gray-500'><p>No data found for the given filter</p></div>".to_string()
    } else {
        format!(
            r#"<div role='table' class='bg-white rounded-xl shadow-sm overflow-hidden'>
    <div role='row' class='{} bg-gray-100 text-xs font-semibold uppercase text-gray-600'>
        <div>Account #</div><div>Customer ID</div><div>Time</div><div>Merchant</div>
        <div>Type</div><div>Fraud</div><div class='text-right'>Amount (USD)</div><div>Status</div>
    </div>
    <div id='transaction-rows'>{}</div>
</div>"#,
            ROW_GRID,
            render_rows(list.rows())
        )
    };
    format!(
        "<div id='transactions-list'>{}{}{}</div>",
        render_heading(list, false),
        body,
        render_footer(list, None)
    )
}

// ==================== Filter Editor ====================

/// Day selector: "All Days" plus every day of the filter's month
pub fn render_day_select(filter: &Filter, oob: bool) -> String {
    let mut options = format!("<option value='' {}>All Days</option>", selected(filter.day.is_none()));
    for date in days_in_month(filter.month, filter.year) {
        let day = chrono::Datelike::day(&date);
        options.push_str(&format!(
            "<option value='{}' {}>{}</option>",
            day,
            selected(filter.day == Some(day)),
            day
        ));
    }
    format!(
        "<select id='day-select' name='day' {} class='w-full px-3 py-2 border rounded-lg bg-white'>{}</select>",
        oob_attr(oob),
        options
    )
}

pub fn render_filter_modal(filter: &Filter, start_year: i32, current_year: i32) -> String {
    let years: String = selectable_years(start_year, current_year)
        .into_iter()
        .map(|y| format!("<option value='{}' {}>{}</option>", y, selected(filter.year == y), y))
        .collect();
    let months: String = (1..=12u32)
        .filter_map(|m| month_name(m).map(|name| (m, name)))
        .map(|(m, name)| format!("<option value='{}' {}>{}</option>", m, selected(filter.month == m), name))
        .collect();
    let page_sizes: String = PageSize::ALL
        .into_iter()
        .map(|p| format!("<option value='{}' {}>{}</option>", p, selected(filter.page_size == p), p))
        .collect();

    format!(
        r#"<div id='filter-modal' class='fixed inset-0 bg-black bg-opacity-50 z-50 flex items-center justify-center' onclick='if(event.target.id === "filter-modal") closeModal()'>
    <div class='bg-white rounded-xl shadow-2xl w-full max-w-lg' onclick='event.stopPropagation()'>
        <div class='flex items-center justify-between px-6 py-4 border-b'>
            <h2 class='text-xl font-bold'>Filter Transactions</h2>
            <button onclick='closeModal()' class='text-gray-500 hover:text-gray-700 p-2'>
                <svg class='w-6 h-6' fill='none' stroke='currentColor' viewBox='0 0 24 24'>
                    <path stroke-linecap='round' stroke-linejoin='round' stroke-width='2' d='M6 18L18 6M6 6l12 12'/>
                </svg>
            </button>
        </div>
        <form hx-get='/transactions/filter' hx-trigger='change' hx-target='#transactions-content' class='p-6 grid grid-cols-2 gap-4'>
            <label class='text-sm font-medium text-gray-700'>Year
                <select name='year' class='w-full px-3 py-2 border rounded-lg bg-white'>{}</select>
            </label>
            <label class='text-sm font-medium text-gray-700'>Month
                <select name='month' class='w-full px-3 py-2 border rounded-lg bg-white'>{}</select>
            </label>
            <label class='text-sm font-medium text-gray-700'>Day
                {}
            </label>
            <label class='text-sm font-medium text-gray-700'>Is Fraud
                <select name='isFraud' class='w-full px-3 py-2 border rounded-lg bg-white'>
                    <option value='true' {}>Yes</option>
                    <option value='false' {}>No</option>
                </select>
            </label>
            <label class='text-sm font-medium text-gray-700'>Page Size
                <select name='pageSize' class='w-full px-3 py-2 border rounded-lg bg-white'>{}</select>
            </label>
        </form>
        <div class='flex justify-end px-6 py-4 border-t'>
            <button onclick='closeModal()' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Done</button>
        </div>
    </div>
</div>"#,
        years,
        months,
        render_day_select(filter, false),
        selected(filter.is_fraud),
        selected(!filter.is_fraud),
        page_sizes
    )
}

// ==================== Detail Editor ====================

/// Save status badge; keeps polling while a save is pending
pub fn render_status_badge(id: u64, status: &SaveStatus, error: Option<&str>) -> String {
    let class = match (status, error) {
        (_, Some(_)) | (SaveStatus::Failed(_), _) => "bg-red-100 text-red-700",
        (SaveStatus::Clean, _) => "bg-gray-100 text-gray-600",
        (SaveStatus::Dirty, _) => "bg-yellow-100 text-yellow-700",
        (SaveStatus::Saving, _) => "bg-blue-100 text-blue-700",
        (SaveStatus::Saved, _) => "bg-green-100 text-green-700",
    };
    let poll = if status.is_pending() {
        format!(
            "hx-get='/transactions/{}/editor/status' hx-trigger='load delay:500ms' hx-swap='outerHTML'",
            id
        )
    } else {
        String::new()
    };
    format!(
        "<span id='editor-status-{}' {} class='px-3 py-1 rounded-full text-sm {}'>{}</span>",
        id,
        poll,
        class,
        escape_html(error.unwrap_or(status.label()))
    )
}

/// Fraud flag banner at the top of the editor, refreshed when the flag changes
pub fn render_fraud_banner(tx: &Transaction, oob: bool) -> String {
    let (class, title, text) = if tx.is_flagged_fraud() {
        (
            "bg-red-50 border-red-200 text-red-800",
            "Fraudulent Transaction",
            "This transaction has been flagged as fraudulent.",
        )
    } else {
        (
            "bg-green-50 border-green-200 text-green-800",
            "Not Fraudulent",
            "This transaction has not been flagged as fraudulent.",
        )
    };
    format!(
        r#"<div id='editor-fraud-{}' {} role='alert' class='mx-6 mt-4 p-4 border rounded-lg text-center {}'>
    <p class='font-semibold'>{}</p>
    <p class='text-sm'>{} If that is not correct, please correct it below.</p>
</div>"#,
        tx.id,
        oob_attr(oob),
        class,
        title,
        text
    )
}

/// Country picker keyed by ISO alpha-2 code, sorted by country name
///
/// A stored code outside the table stays selectable so it is not lost.
fn country_select(common: &str, value: &str) -> String {
    let mut countries: Vec<_> = CountryCode::iter().collect();
    countries.sort_by(|a, b| a.name().cmp(b.name()));

    let mut options = String::new();
    if CountryCode::for_alpha2(value).is_err() {
        let label = if value.is_empty() { "Unknown" } else { value };
        options.push_str(&format!("<option value='{}' selected>{}</option>", value, label));
    }
    for country in countries {
        options.push_str(&format!(
            "<option value='{}' {}>{}</option>",
            country.alpha2(),
            selected(country.alpha2() == value),
            escape_html(country.name())
        ));
    }
    format!("<select {} hx-trigger='change'>{}</select>", common, options)
}

/// Date part of a stored date or date/time, as a `date` input expects it
fn date_value(value: &str) -> String {
    parse_datetime(value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn field_input(id: u64, field: TransactionField, tx: &Transaction) -> String {
    let value = escape_html(&field.value_of(tx));
    let name = field.wire_name();
    let common = format!(
        "name='{}' hx-post='/transactions/{}/editor' hx-target='#editor-status-{}' hx-swap='outerHTML' class='w-full px-3 py-2 border rounded-lg'",
        name, id, id
    );
    match field.kind() {
        FieldKind::Flag => format!(
            "<select {} hx-trigger='change'><option value='TRUE' {}>TRUE</option><option value='FALSE' {}>FALSE</option></select>",
            common,
            selected(value.eq_ignore_ascii_case("TRUE")),
            selected(!value.eq_ignore_ascii_case("TRUE"))
        ),
        FieldKind::DateTime if field == TransactionField::TransactionDateTime => format!(
            "<input type='datetime-local' step='1' value='{}' {} hx-trigger='change'>",
            value, common
        ),
        FieldKind::DateTime => format!(
            "<input type='date' value='{}' {} hx-trigger='change'>",
            date_value(&value),
            common
        ),
        FieldKind::Money => format!(
            "<input type='number' step='0.01' value='{}' {} hx-trigger='input changed'>",
            value, common
        ),
        FieldKind::Digits => format!(
            "<input type='text' inputmode='numeric' maxlength='4' value='{}' {} hx-trigger='input changed'>",
            value, common
        ),
        FieldKind::Text
            if matches!(field, TransactionField::AcqCountry | TransactionField::MerchantCountryCode) =>
        {
            country_select(&common, &value)
        }
        FieldKind::Text => format!(
            "<input type='text' value='{}' {} hx-trigger='input changed'>",
            value, common
        ),
    }
}

fn field_row(label: &str, inputs: &str) -> String {
    format!(
        "<label class='text-sm font-medium text-gray-700 space-y-1'><span>{}</span><div class='flex gap-2'>{}</div></label>",
        escape_html(label),
        inputs
    )
}

pub fn render_editor_modal(tx: &Transaction, status: &SaveStatus) -> String {
    let mut fields = String::new();
    for field in TransactionField::ALL {
        match field {
            TransactionField::CardCvv => {}
            TransactionField::CardLast4Digits => fields.push_str(&field_row(
                "Card Number **** **** + CVV",
                &format!(
                    "{}{}",
                    field_input(tx.id, TransactionField::CardLast4Digits, tx),
                    field_input(tx.id, TransactionField::CardCvv, tx)
                ),
            )),
            _ => fields.push_str(&field_row(field.label(), &field_input(tx.id, field, tx))),
        }
    }

    format!(
        r#"<div id='editor-modal' class='fixed inset-0 bg-black bg-opacity-50 z-50 flex items-center justify-center' onclick='if(event.target.id === "editor-modal") document.getElementById("editor-close").click()'>
    <div class='bg-white rounded-xl shadow-2xl w-full max-w-3xl max-h-[90vh] overflow-y-auto' onclick='event.stopPropagation()'>
        <div class='flex items-center justify-between px-6 py-4 border-b'>
            <div>
                <h2 class='text-xl font-bold'>Transaction #{id}</h2>
                <p class='text-sm text-gray-500'>{merchant} &middot; {amount} &middot; {status_label}</p>
            </div>
            <div class='flex items-center gap-3'>
                {badge}
                <button id='editor-close' hx-delete='/transactions/{id}/editor' hx-target='#modal-root' class='text-gray-500 hover:text-gray-700 p-2'>
                    <svg class='w-6 h-6' fill='none' stroke='currentColor' viewBox='0 0 24 24'>
                        <path stroke-linecap='round' stroke-linejoin='round' stroke-width='2' d='M6 18L18 6M6 6l12 12'/>
                    </svg>
                </button>
            </div>
        </div>
        {banner}
        <div class='p-6 grid grid-cols-2 gap-4'>{fields}</div>
    </div>
</div>"#,
        id = tx.id,
        merchant = escape_html(&tx.merchant_name),
        amount = format_usd(tx.transaction_amount),
        status_label = tx.status_label(),
        badge = render_status_badge(tx.id, status, None),
        banner = render_fraud_banner(tx, false),
        fields = fields,
    )
}
