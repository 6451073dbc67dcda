use heck::ToSnakeCase;
use proc_macro_error2::abort;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Data, DeriveInput, Fields, spanned::Spanned};

/// Configuration parsed from the struct-level `#[entity(...)]` attribute
#[derive(Default)]
struct EntityConfig {
    table: Option<(String, Span)>,
}

/// Configuration parsed from a field-level `#[entity(...)]` attribute
#[derive(Default)]
struct FieldConfig {
    name: Option<(String, Span)>,
    partition_key: Option<(Option<usize>, Span)>,
    clustering_column: Option<(Option<usize>, Span)>,
    transient: Option<Span>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    PartitionKey(usize),
    ClusteringColumn(usize),
    Regular,
}

struct MappedField {
    ident: syn::Ident,
    ty: syn::Type,
    column: String,
    role: Role,
}

#[allow(clippy::needless_pass_by_value)] // DeriveInput is consumed by proc-macro pattern
pub fn expand_derive_entity(input: DeriveInput) -> TokenStream {
    let named = named_fields(&input);
    let config = parse_entity_attrs(&input);
    let table = config
        .table
        .map_or_else(|| input.ident.to_string().to_snake_case(), |(t, _)| t);

    let (columns, transient) = collect_columns(&input.ident, named);
    check_duplicate_columns(&columns);

    generate_impl(&input.ident, &table, &columns, &transient)
}

fn named_fields(input: &DeriveInput) -> &syn::FieldsNamed {
    let Data::Struct(data) = &input.data else {
        abort!(
            input.ident.span(),
            "#[derive(Entity)] can only be applied to structs"
        );
    };
    let Fields::Named(named) = &data.fields else {
        abort!(
            input.ident.span(),
            "#[derive(Entity)] requires a struct with named fields"
        );
    };
    if !input.generics.params.is_empty() {
        abort!(
            input.generics.span(),
            "#[derive(Entity)] does not support generic entities"
        );
    }
    named
}

type KeyField = ((syn::Ident, syn::Type, String), Option<usize>, Span);

/// Mapped columns in key order, plus the transient field names.
fn collect_columns(
    entity: &syn::Ident,
    named: &syn::FieldsNamed,
) -> (Vec<MappedField>, Vec<syn::Ident>) {
    let mut partition_keys: Vec<KeyField> = Vec::new();
    let mut clustering_columns: Vec<KeyField> = Vec::new();
    let mut regular = Vec::new();
    let mut transient = Vec::new();

    for field in &named.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let field_cfg = parse_field_attrs(field);

        if let Some(span) = field_cfg.transient {
            if field_cfg.partition_key.is_some()
                || field_cfg.clustering_column.is_some()
                || field_cfg.name.is_some()
            {
                abort!(span, "a transient field cannot carry other entity attributes");
            }
            transient.push(ident);
            continue;
        }

        if let (Some(_), Some((_, span))) = (&field_cfg.partition_key, &field_cfg.clustering_column)
        {
            abort!(
                *span,
                "entity: specify either `partition_key` or `clustering_column`, not both"
            );
        }

        let column = field_cfg
            .name
            .map_or_else(|| ident.unraw().to_string(), |(n, _)| n);
        let mapped = (ident, field.ty.clone(), column);

        if let Some((index, span)) = field_cfg.partition_key {
            partition_keys.push((mapped, index, span));
        } else if let Some((index, span)) = field_cfg.clustering_column {
            clustering_columns.push((mapped, index, span));
        } else {
            regular.push(mapped);
        }
    }

    if partition_keys.is_empty() {
        abort!(
            entity.span(),
            "entity: at least one field must be marked `#[entity(partition_key)]`"
        );
    }

    let partition = order_keys(partition_keys, "partition_key")
        .into_iter()
        .enumerate()
        .map(|(position, field)| (field, Role::PartitionKey(position)));
    let clustering = order_keys(clustering_columns, "clustering_column")
        .into_iter()
        .enumerate()
        .map(|(position, field)| (field, Role::ClusteringColumn(position)));
    let regular = regular.into_iter().map(|field| (field, Role::Regular));

    let columns = partition
        .chain(clustering)
        .chain(regular)
        .map(|((ident, ty, column), role)| MappedField {
            ident,
            ty,
            column,
            role,
        })
        .collect();
    (columns, transient)
}

fn generate_impl(
    entity_ident: &syn::Ident,
    table: &str,
    columns: &[MappedField],
    transient: &[syn::Ident],
) -> TokenStream {
    let column_defs = columns.iter().map(|field| {
        let name = &field.column;
        let ty = &field.ty;
        let kind = match field.role {
            Role::PartitionKey(i) => quote! { ::cql_mapper::entity::ColumnKind::PartitionKey(#i) },
            Role::ClusteringColumn(i) => {
                quote! { ::cql_mapper::entity::ColumnKind::ClusteringColumn(#i) }
            }
            Role::Regular => quote! { ::cql_mapper::entity::ColumnKind::Regular },
        };
        quote! {
            ::cql_mapper::entity::ColumnDef::new(
                #name,
                <#ty as ::cql_mapper::value::CqlType>::CQL_TYPE,
                #kind,
            )
        }
    });
    let to_values = columns.iter().map(|field| {
        let ident = &field.ident;
        quote! { ::cql_mapper::value::ToCql::to_cql(&self.#ident) }
    });
    let from_row = columns.iter().map(|field| {
        let ident = &field.ident;
        let name = &field.column;
        quote! { #ident: reader.read(#name)? }
    });
    let transient_defaults = transient.iter().map(|ident| {
        quote! { #ident: ::core::default::Default::default() }
    });

    quote! {
        impl ::cql_mapper::entity::Entity for #entity_ident {
            const TABLE: &'static str = #table;

            const COLUMNS: &'static [::cql_mapper::entity::ColumnDef] = &[
                #(#column_defs),*
            ];

            fn to_values(
                &self,
            ) -> ::std::vec::Vec<::core::option::Option<::cql_mapper::value::CqlValue>> {
                ::std::vec![#(#to_values),*]
            }

            fn from_row(row: ::cql_mapper::value::Row) -> ::cql_mapper::Result<Self> {
                let mut reader = ::cql_mapper::entity::RowReader::new(
                    <Self as ::cql_mapper::entity::Entity>::TABLE,
                    row,
                );
                ::core::result::Result::Ok(Self {
                    #(#from_row,)*
                    #(#transient_defaults,)*
                })
            }
        }
    }
}

/// Orders key fields: explicit indexes must be given for all or none of them,
/// and must form a contiguous range starting at 0.
fn order_keys<T>(keys: Vec<(T, Option<usize>, Span)>, attr: &str) -> Vec<T> {
    let explicit = keys.iter().filter(|(_, index, _)| index.is_some()).count();
    if explicit == 0 {
        return keys.into_iter().map(|(field, _, _)| field).collect();
    }
    if explicit != keys.len() {
        let span = keys
            .iter()
            .find(|(_, index, _)| index.is_none())
            .map_or_else(Span::call_site, |(_, _, span)| *span);
        abort!(
            span,
            "entity: either every `{}` carries an index or none does",
            attr
        );
    }

    let mut slots: Vec<Option<T>> = keys.iter().map(|_| None).collect();
    for (field, index, span) in keys {
        let index = index.unwrap_or_default();
        match slots.get_mut(index) {
            Some(slot @ None) => *slot = Some(field),
            Some(Some(_)) => abort!(span, "entity: duplicate `{}` index {}", attr, index),
            None => abort!(
                span,
                "entity: `{}` index {} is out of range; indexes must start at 0 and be contiguous",
                attr,
                index
            ),
        }
    }
    slots.into_iter().flatten().collect()
}

fn check_duplicate_columns(columns: &[MappedField]) {
    for (i, field) in columns.iter().enumerate() {
        if columns[..i].iter().any(|other| other.column == field.column) {
            abort!(
                field.ident.span(),
                "entity: column `{}` is mapped more than once",
                field.column
            );
        }
    }
}

/// Parse the struct-level `#[entity(...)]` attributes with duplicate detection
fn parse_entity_attrs(input: &DeriveInput) -> EntityConfig {
    let mut config = EntityConfig::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            let span = meta.path.span();

            if meta.path.is_ident("table") {
                if config.table.is_some() {
                    abort!(span, "duplicate attribute 'table'");
                }
                let value = parse_string_value(&meta, span);
                if value.is_empty() {
                    abort!(span, "entity: table name must not be empty");
                }
                config.table = Some((value, span));
                return Ok(());
            }

            abort!(
                span,
                "Unknown attribute '{}'. Valid struct attributes: table",
                path_name(&meta)
            );
        });

        if let Err(err) = result {
            abort!(err.span(), "{}", err);
        }
    }

    config
}

/// Parse all field-level `#[entity(...)]` attributes with duplicate detection
fn parse_field_attrs(field: &syn::Field) -> FieldConfig {
    let mut config = FieldConfig::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            let span = meta.path.span();

            if meta.path.is_ident("transient") {
                if config.transient.is_some() {
                    abort!(span, "duplicate attribute 'transient'");
                }
                config.transient = Some(span);
                return Ok(());
            }

            if meta.path.is_ident("partition_key") {
                if config.partition_key.is_some() {
                    abort!(span, "duplicate attribute 'partition_key'");
                }
                config.partition_key = Some((parse_optional_index(&meta)?, span));
                return Ok(());
            }

            if meta.path.is_ident("clustering_column") {
                if config.clustering_column.is_some() {
                    abort!(span, "duplicate attribute 'clustering_column'");
                }
                config.clustering_column = Some((parse_optional_index(&meta)?, span));
                return Ok(());
            }

            if meta.path.is_ident("name") {
                if config.name.is_some() {
                    abort!(span, "duplicate attribute 'name'");
                }
                let value = parse_string_value(&meta, span);
                if value.is_empty() {
                    abort!(span, "entity: column name must not be empty");
                }
                config.name = Some((value, span));
                return Ok(());
            }

            abort!(
                span,
                "Unknown attribute '{}'. Valid field attributes: partition_key, clustering_column, name, transient",
                path_name(&meta)
            );
        });

        if let Err(err) = result {
            abort!(err.span(), "{}", err);
        }
    }

    config
}

fn parse_optional_index(meta: &ParseNestedMeta<'_>) -> syn::Result<Option<usize>> {
    if !meta.input.peek(syn::Token![=]) {
        return Ok(None);
    }
    let lit: syn::LitInt = meta.value()?.parse()?;
    Ok(Some(lit.base10_parse::<usize>()?))
}

fn parse_string_value(meta: &ParseNestedMeta<'_>, span: Span) -> String {
    match meta.value() {
        Ok(v) => match v.parse::<syn::LitStr>() {
            Ok(lit) => lit.value(),
            Err(_) => abort!(span, "Expected string literal"),
        },
        Err(_) => abort!(span, "Expected '=' followed by a string value"),
    }
}

fn path_name(meta: &ParseNestedMeta<'_>) -> String {
    meta.path
        .get_ident()
        .map(ToString::to_string)
        .unwrap_or_default()
}
