use proc_macro2::Span;
use syn::{parse::Parse, Attribute, Data, DataStruct, Field, Ident, LitStr, Token};

#[derive(Debug, Default)]
pub struct EmptyAttribute;

impl Parse for EmptyAttribute {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        if !input.is_empty() {
            return Err(syn::Error::new(input.span(), "Unexpected attribute"));
        }
        Ok(EmptyAttribute)
    }
}

impl ItemAttr for EmptyAttribute {
    fn combine(&mut self, _other: Self) {}
}

pub trait ItemAttr {
    fn combine(&mut self, other: Self);
}

/// Per-field `#[codec(...)]` options.
#[derive(Debug, Default)]
pub struct FieldAttr {
    /// `#[codec(skip)]`: the field is omitted from encode/decode entirely
    /// and rebuilt via `Default` on decode.
    pub skip: bool,
    /// `#[codec(include)]`: force a non-`pub` field to participate in the
    /// struct's strict encoding (normally only `pub` fields do).
    pub include: bool,
    /// `#[codec(rename = "...")]`: wire name (and loose field-id hash input)
    /// to use instead of the Rust identifier.
    pub rename: Option<String>,
}

impl Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let mut slf = Self::default();
        loop {
            let ident: Ident = input.parse()?;
            match ident.to_string().as_str() {
                "skip" => slf.skip = true,
                "include" => slf.include = true,
                "rename" => {
                    input.parse::<Token![=]>()?;
                    let val: LitStr = input.parse()?;
                    slf.rename = Some(val.value());
                }
                _ => return Err(syn::Error::new_spanned(ident, "Unknown attribute value")),
            }
            if !input.peek(Token![,]) {
                break;
            }
            input.parse::<Token![,]>()?;
        }
        Ok(slf)
    }
}

impl ItemAttr for FieldAttr {
    fn combine(&mut self, other: Self) {
        self.skip |= other.skip;
        self.include |= other.include;
        if other.rename.is_some() {
            self.rename = other.rename;
        }
    }
}

pub struct StructField<T> {
    pub ident: Ident,
    pub typ: syn::Type,
    pub vis: syn::Visibility,
    pub attr: T,
}

pub struct StructItem<TFieldAttr, TAttr> {
    pub ident: Ident,
    pub fields: Vec<StructField<TFieldAttr>>,
    pub attribute: TAttr,
}

impl<TFieldAttr: Parse + ItemAttr + Default, TAttr: Parse + ItemAttr + Default>
    StructItem<TFieldAttr, TAttr>
{
    pub fn from_input(
        input: DataStruct,
        attributes: Vec<Attribute>,
        ident: Ident,
    ) -> syn::Result<Self> {
        let fields = input
            .fields
            .into_iter()
            .map(StructField::from_field)
            .collect::<Result<Vec<_>, _>>()?;

        let mut final_attr = TAttr::default();
        for attr in attributes {
            if attr.path().segments.len() == 1
                && attr
                    .path()
                    .segments
                    .first()
                    .is_some_and(|s| s.ident == "codec")
            {
                let data: TAttr = attr.parse_args()?;
                final_attr.combine(data);
            }
        }

        Ok(Self {
            ident,
            fields,
            attribute: final_attr,
        })
    }
}

impl<T: Parse + ItemAttr + Default> StructField<T> {
    pub fn from_field(field: Field) -> syn::Result<Self> {
        let Some(ident) = field.ident else {
            return Err(syn::Error::new_spanned(
                field,
                "Derive macro input must have named fields",
            ));
        };
        let mut final_attr = T::default();
        for attr in field.attrs {
            if attr.path().segments.len() == 1
                && attr
                    .path()
                    .segments
                    .first()
                    .is_some_and(|s| s.ident == "codec")
            {
                let data: T = attr.parse_args()?;
                final_attr.combine(data);
            }
        }
        Ok(StructField {
            ident,
            typ: field.ty,
            vis: field.vis,
            attr: final_attr,
        })
    }
}

pub fn expect_struct(input: Data) -> syn::Result<DataStruct> {
    match input {
        syn::Data::Struct(s) => Ok(s),
        _ => Err(syn::Error::new(
            Span::call_site(),
            "Derive macro input must be a struct",
        )),
    }
}
